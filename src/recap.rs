//! Monthly recap of completed repairs and the technicians' bonus.
//!
//! Months are taken from the intake date in UTC.

use derive_more::Display;
use itertools::Itertools as _;
use time::{Date, Month, UtcOffset};

use crate::{
    reception::Reception,
    session::{Action, Session},
    Error,
};

/// Bonus earned per finished repair, in dinars.
pub const FINISHED_BONUS: f64 = 1.5;

/// Penalty per returned repair, in dinars.
pub const RETURNED_PENALTY: f64 = 5.0;

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Outcome {
    #[display("finished")]
    Finished,
    #[display("returned")]
    Returned,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry<'a> {
    pub outcome: Outcome,
    pub reception: &'a Reception,
}

impl Entry<'_> {
    /// Serial number, or the reception number for items finished without
    /// one.
    pub fn reference(&self) -> &str {
        self.reception
            .serial_number()
            .unwrap_or(&self.reception.reception_number)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonthStats {
    pub finished: usize,
    pub returned: usize,
}

impl MonthStats {
    pub fn total(&self) -> usize {
        self.finished + self.returned
    }

    /// May be negative.
    pub fn bonus(&self) -> f64 {
        self.finished as f64 * FINISHED_BONUS
            - self.returned as f64 * RETURNED_PENALTY
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthGroup<'a> {
    pub year: i32,
    pub month: Month,
    pub stats: MonthStats,
    pub entries: Vec<Entry<'a>>,
}

impl MonthGroup<'_> {
    /// French label such as `Mars 2025`.
    pub fn label(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recap<'a> {
    /// Most recent month first.
    pub months: Vec<MonthGroup<'a>>,
    pub total_items: usize,
    pub total_bonus: f64,
    pub current_month: MonthStats,
}

impl<'a> Recap<'a> {
    pub fn build(
        receptions: impl IntoIterator<Item = &'a Reception>,
        today: Date,
    ) -> Self {
        let months = receptions
            .into_iter()
            .filter(|r| r.is_completed())
            .into_group_map_by(|r| {
                let (year, month) = intake_month(r);
                (year, month as u8)
            })
            .into_iter()
            .sorted_unstable_by_key(|&(key, _)| std::cmp::Reverse(key))
            .map(|((year, _), members)| {
                let entries = members
                    .into_iter()
                    .map(|reception| Entry {
                        outcome: if reception.is_returned {
                            Outcome::Returned
                        } else {
                            Outcome::Finished
                        },
                        reception,
                    })
                    .collect::<Vec<_>>();
                let returned = entries
                    .iter()
                    .filter(|e| e.outcome == Outcome::Returned)
                    .count();
                MonthGroup {
                    year,
                    month: intake_month(entries[0].reception).1,
                    stats: MonthStats {
                        finished: entries.len() - returned,
                        returned,
                    },
                    entries,
                }
            })
            .collect::<Vec<_>>();

        let current_month = months
            .iter()
            .find(|g| g.year == today.year() && g.month == today.month())
            .map(|g| g.stats)
            .unwrap_or_default();

        Self {
            total_items: months.iter().map(|g| g.stats.total()).sum(),
            total_bonus: months.iter().map(|g| g.stats.bonus()).sum(),
            current_month,
            months,
        }
    }

    /// Builds the recap for an administrator.
    pub fn for_session(
        session: &Session,
        receptions: &'a [Reception],
        today: Date,
    ) -> Result<Self, Error> {
        session.authorize(Action::ViewRecap)?;
        Ok(Self::build(receptions, today))
    }
}

pub fn month_name(month: Month) -> &'static str {
    use Month as M;

    match month {
        M::January => "Janvier",
        M::February => "Février",
        M::March => "Mars",
        M::April => "Avril",
        M::May => "Mai",
        M::June => "Juin",
        M::July => "Juillet",
        M::August => "Août",
        M::September => "Septembre",
        M::October => "Octobre",
        M::November => "Novembre",
        M::December => "Décembre",
    }
}

/// Year and month of the intake date, in UTC.
fn intake_month(reception: &Reception) -> (i32, Month) {
    let intake = reception.created_at.to_offset(UtcOffset::UTC).date();
    (intake.year(), intake.month())
}

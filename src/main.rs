use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use time::OffsetDateTime;
use tokio::fs;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use etrier_workshop::{
    api::{
        catalog::{CustomerId, EtrierId, Part, PartId},
        user::{self, Role},
    },
    backend,
    recap::Recap,
    reception::{
        self, parts, serial, NewReception, PartsLedger, Position, Reception,
        ReceptionStore as _, Workflow,
    },
    session::FileStore,
    users,
    view::{Board, Query, StatusFilter, View},
    Config, Session,
};

#[derive(Parser)]
#[command(name = "etrier", about = "Caliper workshop repair tracking", version)]
struct Cli {
    /// Configuration file.
    #[arg(long, short, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Log requests.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Login {
        name: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    DeleteAccount {
        #[arg(long)]
        password: String,
    },
    #[command(flatten)]
    Operation(Operation),
}

/// Commands run on behalf of a logged-in operator.
#[derive(Subcommand)]
enum Operation {
    Whoami,
    /// List receptions as seen from one of the workshop screens.
    List {
        #[arg(long, value_enum, default_value_t = ViewArg::Reception)]
        view: ViewArg,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = StatusArg::All)]
        status: StatusArg,
    },
    Show {
        id: String,
    },
    /// Customers and caliper models to pick from when receiving an item.
    References,
    Receive {
        #[arg(long)]
        client: String,
        #[arg(long)]
        etrier: String,
        #[arg(long, value_enum, default_value_t = PositionArg::FrontLeft)]
        position: PositionArg,
        #[arg(long, default_value = "")]
        observation: String,
    },
    Start {
        id: String,
    },
    /// Finish a repair. Without `--serial` the next serial is suggested.
    Finish {
        id: String,
        #[arg(long)]
        serial: Option<String>,
    },
    Deliver {
        id: String,
    },
    /// Request a return, or confirm it directly when run by an admin.
    Return {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    ApproveReturn {
        id: String,
    },
    CompleteReturn {
        id: String,
    },
    #[command(subcommand)]
    Parts(PartsCommand),
    Recap,
    #[command(subcommand)]
    Users(UsersCommand),
}

#[derive(Subcommand)]
enum PartsCommand {
    Show { id: String },
    Search { term: String },
    Add { id: String, part: String },
    /// Add the part matching a barcode or reference.
    Scan { id: String, code: String },
    Remove { id: String, part: String },
    Set { id: String, part: String, quantity: u32 },
}

#[derive(Subcommand)]
enum UsersCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
    Delete {
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Reception,
    Finished,
    Delivered,
}

impl From<ViewArg> for View {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Reception => Self::Reception,
            ViewArg::Finished => Self::Finished,
            ViewArg::Delivered => Self::Delivered,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    All,
    Received,
    InProgress,
    Returned,
}

impl From<StatusArg> for StatusFilter {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::All => Self::All,
            StatusArg::Received => Self::Received,
            StatusArg::InProgress => Self::InProgress,
            StatusArg::Returned => Self::Returned,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PositionArg {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl From<PositionArg> for Position {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::FrontLeft => Self::FrontLeft,
            PositionArg::FrontRight => Self::FrontRight,
            PositionArg::RearLeft => Self::RearLeft,
            PositionArg::RearRight => Self::RearRight,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::User => Self::User,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        })
        .init();

    let config = fs::read_to_string(&cli.config).await?;
    let config = toml::from_str::<Config>(&config)?;

    let store = FileStore::new(config.credentials.path);
    let mut client = backend::connect(&config.api)?;

    let session = Session::restore(&store).await?;
    if let Some(session) = &session {
        client.set_auth_token(Some(session.token().to_owned()));
    }

    match cli.command {
        Command::Login { name, password } => {
            let session =
                Session::login(&mut client, &store, &name, &password).await?;
            println!("logged in as {} ({})", session.user().name, session.role());
        }
        Command::Logout => Session::logout(&store).await?,
        Command::DeleteAccount { password } => {
            let session = session.ok_or(etrier_workshop::Error::Unauthorized)?;
            users::delete_account(&mut client, session, &store, &password)
                .await?;
            println!("account deleted");
        }
        Command::Operation(operation) => {
            let session = session.ok_or(etrier_workshop::Error::Unauthorized)?;
            run(operation, Workflow::new(client), &session).await?;
        }
    }

    Ok(())
}

async fn run(
    operation: Operation,
    workflow: Workflow<backend::Client>,
    session: &Session,
) -> Result<(), etrier_workshop::Error> {
    let client = workflow.store();

    match operation {
        Operation::Whoami => {
            let user = session.user();
            println!("{} ({}), id {}", user.name, user.role, user.id);
        }
        Operation::List {
            view,
            search,
            status,
        } => {
            let mut board = Board::default();
            board.refresh(client).await?;
            let query = Query::new(view.into())
                .search(search.unwrap_or_default())
                .status(status.into());
            for reception in board.query(&query) {
                print_reception(reception);
            }
        }
        Operation::Show { id } => {
            let reception = client.get_reception(&id.as_str().into()).await?;
            print_reception(&reception);
            if let Some(reason) = &reception.return_reason {
                println!("  return {}: {reason}", reception.return_status);
            }
            if !reception.observation.is_empty() {
                println!("  observation: {}", reception.observation);
            }
            print_parts(&reception, &client.parts_catalog().await?);
        }
        Operation::References => {
            let references = client.reference_data().await?;
            println!("customers:");
            for customer in &references.customers {
                println!("  {}  {}", customer.id, customer.name);
            }
            println!("caliper models:");
            for etrier in &references.etriers {
                println!("  {}  {}", etrier.id, etrier.car_model);
            }
        }
        Operation::Receive {
            client,
            etrier,
            position,
            observation,
        } => {
            let reception = workflow
                .receive(
                    session,
                    NewReception {
                        client: CustomerId::from(client),
                        etrier: EtrierId::from(etrier),
                        position: position.into(),
                        observation,
                    },
                )
                .await?;
            print_reception(&reception);
        }
        Operation::Start { id } => {
            print_reception(&workflow.start(session, &id.as_str().into()).await?);
        }
        Operation::Finish { id, serial } => {
            let serial = match serial {
                Some(serial) => serial,
                None => {
                    let receptions = client.list_receptions().await?;
                    let suggested = serial::suggest(
                        &receptions,
                        OffsetDateTime::now_utc().date(),
                    );
                    println!("using suggested serial {suggested}");
                    suggested
                }
            };
            let reception = workflow
                .finish(session, &id.as_str().into(), &serial)
                .await?;
            print_reception(&reception);
        }
        Operation::Deliver { id } => {
            print_reception(
                &workflow.deliver(session, &id.as_str().into()).await?,
            );
        }
        Operation::Return { id, reason } => {
            let reception = workflow
                .request_return(session, &id.as_str().into(), reason.as_deref())
                .await?;
            print_reception(&reception);
        }
        Operation::ApproveReturn { id } => {
            print_reception(
                &workflow.approve_return(session, &id.as_str().into()).await?,
            );
        }
        Operation::CompleteReturn { id } => {
            print_reception(
                &workflow.complete_return(session, &id.as_str().into()).await?,
            );
        }
        Operation::Parts(command) => {
            run_parts(command, &workflow, session).await?;
        }
        Operation::Recap => {
            let mut board = Board::default();
            board.refresh(client).await?;
            let today = OffsetDateTime::now_utc().date();
            let recap = Recap::for_session(session, board.receptions(), today)?;

            println!(
                "{} items, {} this month, bonus {:.1} DT",
                recap.total_items,
                recap.current_month.total(),
                recap.total_bonus,
            );
            for month in &recap.months {
                println!(
                    "{}: {} finished, {} returned, {:.1} DT",
                    month.label(),
                    month.stats.finished,
                    month.stats.returned,
                    month.stats.bonus(),
                );
                for entry in &month.entries {
                    println!(
                        "  {}  {}  {}",
                        entry.reference(),
                        entry.reception.client_name(),
                        entry.outcome,
                    );
                }
            }
        }
        Operation::Users(UsersCommand::List) => {
            for user in users::list_users(client, session).await? {
                println!("{}  {} ({})", user.id, user.name, user.role);
            }
        }
        Operation::Users(UsersCommand::Add {
            name,
            password,
            role,
        }) => {
            let user =
                users::create_user(client, session, &name, &password, role.into())
                    .await?;
            println!("created {} ({}), id {}", user.name, user.role, user.id);
        }
        Operation::Users(UsersCommand::Delete { id }) => {
            users::delete_user(client, session, &user::Id::from(id)).await?;
            println!("deleted");
        }
    }

    Ok(())
}

async fn run_parts(
    command: PartsCommand,
    workflow: &Workflow<backend::Client>,
    session: &Session,
) -> Result<(), etrier_workshop::Error> {
    use etrier_workshop::Error as E;

    let client = workflow.store();
    let catalog = client.parts_catalog().await?;

    let reception = match command {
        PartsCommand::Search { term } => {
            for part in parts::search(&catalog, &term) {
                print_part(part);
            }
            return Ok(());
        }
        PartsCommand::Show { id } => {
            client.get_reception(&id.as_str().into()).await?
        }
        PartsCommand::Add { id, part } => {
            edit_parts(workflow, session, id, |ledger| {
                ledger.add(PartId::from(part));
                Ok(())
            })
            .await?
        }
        PartsCommand::Scan { id, code } => {
            let part = parts::lookup_code(&catalog, &code)
                .ok_or_else(|| E::NotFound(format!("no part matches {code}")))?;
            edit_parts(workflow, session, id, |ledger| {
                ledger.add(part.id.clone());
                Ok(())
            })
            .await?
        }
        PartsCommand::Remove { id, part } => {
            edit_parts(workflow, session, id, |ledger| {
                if ledger.remove(&PartId::from(part.as_str())) {
                    Ok(())
                } else {
                    Err(E::NotFound(format!("part {part} is not attached")))
                }
            })
            .await?
        }
        PartsCommand::Set { id, part, quantity } => {
            edit_parts(workflow, session, id, |ledger| {
                ledger.set_quantity(PartId::from(part), quantity);
                Ok(())
            })
            .await?
        }
    };

    print_parts(&reception, &catalog);
    Ok(())
}

/// Applies `edit` to the current parts of a reception and saves the result.
async fn edit_parts(
    workflow: &Workflow<backend::Client>,
    session: &Session,
    id: String,
    edit: impl FnOnce(&mut PartsLedger) -> Result<(), etrier_workshop::Error>,
) -> Result<Reception, etrier_workshop::Error> {
    let id = reception::Id::from(id);
    let mut ledger = workflow.store().get_reception(&id).await?.parts;
    edit(&mut ledger)?;
    workflow.update_parts(session, &id, ledger).await
}

fn print_reception(r: &Reception) {
    println!(
        "{}  #{}  {}{}  {}  {}  {}  {}",
        r.id,
        r.reception_number,
        r.status(),
        if r.delivered { ", delivered" } else { "" },
        r.client_name(),
        r.car_model(),
        r.position,
        r.serial_number().unwrap_or("-"),
    );
}

fn print_part(part: &Part) {
    println!(
        "  {}  {}  {}",
        part.id, part.reference_article, part.designation,
    );
}

fn print_parts(reception: &Reception, catalog: &[Part]) {
    for (id, part, quantity) in reception.parts.resolve(catalog) {
        match part {
            Some(part) => println!(
                "  {quantity} x {} ({})",
                part.designation, part.reference_article,
            ),
            None => println!("  {quantity} x unknown part {id}"),
        }
    }
}

use crate::{
    api::catalog::{Customer, Etrier, Part},
    Error,
};

use super::Client;

/// Lookup lists needed by the intake form.
#[derive(Clone, Debug, Default)]
pub struct ReferenceData {
    pub customers: Vec<Customer>,
    pub etriers: Vec<Etrier>,
}

impl Client {
    pub async fn parts_catalog(&self) -> Result<Vec<Part>, Error> {
        self.fetch_list("/pieces").await
    }

    pub async fn customers(&self) -> Result<Vec<Customer>, Error> {
        self.fetch_list("/clients").await
    }

    pub async fn etriers(&self) -> Result<Vec<Etrier>, Error> {
        self.fetch_list("/etriers").await
    }

    pub async fn reference_data(&self) -> Result<ReferenceData, Error> {
        let (customers, etriers) =
            tokio::try_join!(self.customers(), self.etriers())?;
        Ok(ReferenceData { customers, etriers })
    }
}

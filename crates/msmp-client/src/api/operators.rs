use msmp_core::models::{Operator, Player};
use msmp_core::Params;

use super::methods;
use crate::{ClientError, MsmpClient, Result};

impl MsmpClient {
    pub async fn operators(&self) -> Result<Vec<Operator>> {
        self.request(methods::OPERATORS, Params::None).await
    }

    pub async fn set_operators(&self, operators: &[Operator]) -> Result<Vec<Operator>> {
        validate(operators)?;
        self.request(methods::OPERATORS_SET, Params::many(operators)?)
            .await
    }

    pub async fn add_operators(&self, operators: &[Operator]) -> Result<Vec<Operator>> {
        validate(operators)?;
        self.request(methods::OPERATORS_ADD, Params::many(operators)?)
            .await
    }

    pub async fn remove_operators(&self, players: &[Player]) -> Result<Vec<Operator>> {
        self.request(methods::OPERATORS_REMOVE, Params::many(players)?)
            .await
    }

    pub async fn clear_operators(&self) -> Result<Vec<Operator>> {
        self.request(methods::OPERATORS_CLEAR, Params::None).await
    }
}

fn validate(operators: &[Operator]) -> Result<()> {
    operators
        .iter()
        .try_for_each(Operator::validate)
        .map_err(ClientError::from)
}

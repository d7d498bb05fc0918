use msmp_core::models::{TypedGameRule, UntypedGameRule};
use msmp_core::Params;

use super::methods;
use crate::{MsmpClient, Result};

impl MsmpClient {
    pub async fn gamerules(&self) -> Result<Vec<TypedGameRule>> {
        self.request(methods::GAMERULES, Params::None).await
    }

    /// Update one rule; the server answers with the rule as it now stands
    pub async fn update_gamerule(&self, rule: &UntypedGameRule) -> Result<TypedGameRule> {
        self.request(methods::GAMERULES_UPDATE, Params::single(rule)?)
            .await
    }
}

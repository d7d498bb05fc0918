use msmp_core::models::{IncomingIpBan, IpBan, Player, UserBan};
use msmp_core::Params;

use super::methods;
use crate::{ClientError, MsmpClient, Result};

impl MsmpClient {
    pub async fn bans(&self) -> Result<Vec<UserBan>> {
        self.request(methods::BANS, Params::None).await
    }

    pub async fn set_bans(&self, bans: &[UserBan]) -> Result<Vec<UserBan>> {
        self.request(methods::BANS_SET, Params::many(bans)?).await
    }

    pub async fn add_bans(&self, bans: &[UserBan]) -> Result<Vec<UserBan>> {
        self.request(methods::BANS_ADD, Params::many(bans)?).await
    }

    pub async fn remove_bans(&self, players: &[Player]) -> Result<Vec<UserBan>> {
        self.request(methods::BANS_REMOVE, Params::many(players)?)
            .await
    }

    pub async fn clear_bans(&self) -> Result<Vec<UserBan>> {
        self.request(methods::BANS_CLEAR, Params::None).await
    }

    pub async fn ip_bans(&self) -> Result<Vec<IpBan>> {
        self.request(methods::IP_BANS, Params::None).await
    }

    pub async fn set_ip_bans(&self, bans: &[IpBan]) -> Result<Vec<IpBan>> {
        self.request(methods::IP_BANS_SET, Params::many(bans)?)
            .await
    }

    /// Ban by address, or by the current address of an online player
    pub async fn add_ip_bans(&self, bans: &[IncomingIpBan]) -> Result<Vec<IpBan>> {
        for ban in bans {
            ban.validate().map_err(ClientError::from)?;
        }
        self.request(methods::IP_BANS_ADD, Params::many(bans)?)
            .await
    }

    pub async fn remove_ip_bans(&self, ips: &[String]) -> Result<Vec<IpBan>> {
        self.request(methods::IP_BANS_REMOVE, Params::many(ips)?)
            .await
    }

    pub async fn clear_ip_bans(&self) -> Result<Vec<IpBan>> {
        self.request(methods::IP_BANS_CLEAR, Params::None).await
    }
}

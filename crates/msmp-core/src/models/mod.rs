pub mod ban;
pub mod config;
pub mod gamerule;
pub mod player;
pub mod server;

pub use ban::{IncomingIpBan, IpBan, UserBan};
pub use config::ClientConfig;
pub use gamerule::{GameRuleType, TypedGameRule, UntypedGameRule};
pub use player::{Operator, Player};
pub use server::{Difficulty, GameMode, KickPlayer, Message, ServerState, SystemMessage, Version};

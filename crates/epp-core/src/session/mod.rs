//! 会话建立与协商：问候语、Login/Logout 与消息轮询。
//!
//! # 模块划分（How）
//! - [`greeting`]：服务端问候语、服务菜单与数据收集策略；
//! - [`login`]：Login/Logout 载荷与两条协商定律（子集律、归并律）；
//! - [`poll`]：消息队列轮询载荷。

mod greeting;
mod login;
mod poll;

pub use greeting::{
    DataCollectionPolicy, DcpAccess, DcpExpiry, DcpPurpose, DcpRecipient, DcpRetention,
    DcpStatement, Greeting, ServiceMenu, decode_greeting,
};
pub use login::{
    CLIENT_ID_MAX, CLIENT_ID_MIN, DEFAULT_LANGUAGE, LoginCommand, LogoutCommand, PASSWORD_MAX,
    PASSWORD_MIN, PROTOCOL_VERSION,
};
pub use poll::{PollCommand, PollOp};

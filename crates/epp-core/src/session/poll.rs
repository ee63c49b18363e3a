//! 消息队列轮询命令。
//!
//! # 契约说明（What）
//! - `op="req"`：请求队首消息，不携带消息标识；
//! - `op="ack"`：确认并出队一条消息，`msgID` 必填——编码期缺失即失败，
//!   解码期缺失视为报文畸形。

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::any::Any;
use core::fmt;

use crate::command::{CommandKind, CommandPayload};
use crate::component::{DecodeContext, EncodeContext};
use crate::error::{EppError, Result, codes};
use crate::xml::{Element, ns};

/// 轮询子操作。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOp {
    /// 请求队首消息。
    Req,
    /// 确认并出队。
    Ack,
}

impl PollOp {
    /// 线上属性字面量。
    pub fn as_str(self) -> &'static str {
        match self {
            PollOp::Req => "req",
            PollOp::Ack => "ack",
        }
    }

    /// 从线上字面量解析。
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "req" => Ok(PollOp::Req),
            "ack" => Ok(PollOp::Ack),
            other => Err(EppError::new(
                codes::DECODE_OUT_OF_RANGE,
                format!("`{other}` is not a poll operation"),
            )),
        }
    }
}

impl fmt::Display for PollOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 轮询命令载荷。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollCommand {
    op: PollOp,
    message_id: Option<String>,
}

impl Default for PollCommand {
    fn default() -> Self {
        Self::request()
    }
}

impl PollCommand {
    /// 构造 `req` 轮询。
    pub fn request() -> Self {
        Self {
            op: PollOp::Req,
            message_id: None,
        }
    }

    /// 构造 `ack` 确认。
    pub fn acknowledge(message_id: impl Into<String>) -> Self {
        Self {
            op: PollOp::Ack,
            message_id: Some(message_id.into()),
        }
    }

    /// 子操作。
    pub fn op(&self) -> PollOp {
        self.op
    }

    /// 被确认的消息标识。
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }
}

impl CommandPayload for PollCommand {
    fn namespace(&self) -> &str {
        ns::EPP
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Poll
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        let mut poll = Element::new(ns::EPP, "poll").with_attribute("op", self.op.as_str());
        if self.op == PollOp::Ack {
            match &self.message_id {
                Some(id) => poll.set_attribute("msgID", id.clone()),
                None => return Err(EppError::missing_attribute("msgID")),
            }
        }
        Ok(poll)
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.op = PollOp::parse(verb.require_attribute("op")?)?;
        self.message_id = verb.attribute("msgID").map(ToOwned::to_owned);
        if self.op == PollOp::Ack && self.message_id.is_none() {
            return Err(EppError::malformed("poll ack is missing msgID"));
        }
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

//! 消息契约与根元素分发。
//!
//! # 设计目标（Why）
//! - 消息在组件契约之上只多一件事：自报命名空间身份；三种角色
//!   （命令、响应、问候语）共享该契约，会话层得以用统一类型承接收到的根元素；
//! - [`decode_message`] 是接收路径的唯一入口：按根元素的首个子元素分发到
//!   对应的解码驱动，调用方无需自行嗅探报文角色。

use crate::command::{Command, decode_command};
use crate::component::{Component, DecodeContext, EncodeContext};
use crate::error::{EppError, Result};
use crate::response::{Response, decode_response};
use crate::session::{Greeting, decode_greeting};
use crate::xml::{Element, ns};

use alloc::boxed::Box;
use alloc::format;

/// 消息契约：具备命名空间身份的组件。
pub trait Message: Component {
    /// 消息载荷所属的命名空间 URI（无映射载荷时为核心命名空间）。
    fn namespace(&self) -> &str;
}

/// `<hello>`：客户端索要问候语的空消息。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hello;

impl Component for Hello {
    fn encode(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        Ok(Element::new(ns::EPP, "epp").with_child(Element::new(ns::EPP, "hello")))
    }

    fn decode(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        element.require_child(ns::EPP, "hello")?;
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(*self)
    }
}

impl Message for Hello {
    fn namespace(&self) -> &str {
        ns::EPP
    }
}

/// 接收路径的统一产物：一条已解码的 EPP 消息。
pub enum EppMessage {
    /// 客户端命令。
    Command(Command),
    /// 服务端响应。
    Response(Response),
    /// 连接建立时的服务端问候语。
    Greeting(Greeting),
    /// 客户端的问候语索要。
    Hello,
}

impl core::fmt::Debug for EppMessage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EppMessage::Command(_) => f.write_str("EppMessage::Command"),
            EppMessage::Response(_) => f.write_str("EppMessage::Response"),
            EppMessage::Greeting(_) => f.write_str("EppMessage::Greeting"),
            EppMessage::Hello => f.write_str("EppMessage::Hello"),
        }
    }
}

/// 按根元素分发解码。
///
/// # 契约说明（What）
/// - 根元素必须是核心命名空间的 `<epp>` 且恰有一个角色子元素；
/// - 未知角色报 `epp.decode.malformed`；各角色内部的失败语义见对应驱动。
pub fn decode_message(root: &Element, ctx: &DecodeContext<'_>) -> Result<EppMessage> {
    if !root.is_named(ns::EPP, "epp") {
        return Err(EppError::malformed(format!(
            "document root <{}> is not an epp envelope",
            root.local_name()
        )));
    }
    let role = root
        .first_child()
        .ok_or_else(|| EppError::malformed("epp envelope is empty"))?;
    if role.namespace() != ns::EPP {
        return Err(EppError::malformed(format!(
            "envelope child <{}> is outside the epp namespace",
            role.local_name()
        )));
    }
    match role.local_name() {
        "command" => Ok(EppMessage::Command(decode_command(root, ctx)?)),
        "response" => Ok(EppMessage::Response(decode_response(root, ctx)?)),
        "greeting" => Ok(EppMessage::Greeting(decode_greeting(root, ctx)?)),
        "hello" => Ok(EppMessage::Hello),
        other => Err(EppError::malformed(format!(
            "`{other}` is not an epp message role"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ExtensionRegistry;

    #[test]
    fn hello_round_trips_and_dispatches() {
        // Why: hello 虽然没有字段，也必须走统一的信封校验与分发路径。
        let registry = ExtensionRegistry::new();
        let encode_ctx = EncodeContext::new(&registry);
        let decode_ctx = DecodeContext::new(&registry);
        let encoded = Hello.encode(&encode_ctx).expect("encode succeeds");
        match decode_message(&encoded, &decode_ctx).expect("dispatch succeeds") {
            EppMessage::Hello => {}
            _ => panic!("hello must dispatch to the hello arm"),
        }
    }

    #[test]
    fn unknown_role_is_malformed() {
        let registry = ExtensionRegistry::new();
        let decode_ctx = DecodeContext::new(&registry);
        let root = Element::new(ns::EPP, "epp").with_child(Element::new(ns::EPP, "gossip"));
        let err = decode_message(&root, &decode_ctx).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::DECODE_MALFORMED);
    }
}

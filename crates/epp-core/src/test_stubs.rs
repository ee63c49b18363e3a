//! 测试桩命名空间：框架官方维护的 Stub 映射与扩展，供单元与集成测试复用。
//!
//! # 设计背景（Why）
//! - 注册中心、信封驱动与协商逻辑的测试都需要“最小但完整”的映射/扩展实现；
//!   集中维护避免在各处重复定义，核心契约演进时单点同步；
//! - 桩对象刻意保持单字段结构，断言聚焦在分发与往返语义上。
//!
//! # 使用方式（How）
//! - 单元测试直接 `use crate::test_stubs::*;`；
//! - 集成测试通过 `epp_core::test_stubs::*` 复用同一组桩。

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use crate::command::{Command, CommandKind, CommandPayload};
use crate::component::{Component, DecodeContext, EncodeContext, ExtensionComponent};
use crate::error::{EppError, Result};
use crate::registry::{ExtensionFactory, MappingFactory, ServiceDescriptor};
use crate::response::{Response, ResponsePayload};
use crate::xml::{Element, ns};

/// 桩映射命名空间。
pub const STUB_NS: &str = "urn:example:stub-1.0";
/// 桩扩展命名空间。
pub const MARKER_NS: &str = "urn:example:marker-1.0";

/// 桩对象命令：携带一组名字，动词形态随 [`CommandKind`] 变化。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubCheckCommand {
    kind: CommandKind,
    names: Vec<String>,
}

impl Default for StubCheckCommand {
    fn default() -> Self {
        Self::empty(CommandKind::Check)
    }
}

impl StubCheckCommand {
    /// 构造给定动词、无名字的空桩。
    pub fn empty(kind: CommandKind) -> Self {
        Self {
            kind,
            names: Vec::new(),
        }
    }

    /// 构造携带名字列表的 check 桩。
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: CommandKind::Check,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// 构造 transfer 动词的桩，用于验证驱动器的 `op` 属性不变式。
    pub fn transfer_probe() -> Self {
        Self::empty(CommandKind::Transfer)
    }

    /// 名字列表。
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl CommandPayload for StubCheckCommand {
    fn namespace(&self) -> &str {
        STUB_NS
    }

    fn kind(&self) -> CommandKind {
        self.kind
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        let mut mapping = Element::new(STUB_NS, self.kind.tag());
        for name in &self.names {
            mapping.push_child(Element::new(STUB_NS, "name").with_text(name.clone()));
        }
        Ok(Element::new(ns::EPP, self.kind.tag()).with_child(mapping))
    }

    fn decode_payload(&mut self, verb: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        let mapping = verb.require_child(STUB_NS, self.kind.tag())?;
        self.names = mapping
            .children_named(STUB_NS, "name")
            .map(|name| name.require_text().map(ToOwned::to_owned))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn CommandPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 桩响应数据：单 token 的 `pongData` 块。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StubPongData {
    token: String,
}

impl StubPongData {
    /// 以 token 构造。
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// token 值。
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl ResponsePayload for StubPongData {
    fn namespace(&self) -> &str {
        STUB_NS
    }

    fn encode_payload(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        Ok(Element::new(STUB_NS, "pongData")
            .with_child(Element::new(STUB_NS, "token").with_text(self.token.clone())))
    }

    fn decode_payload(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.token = element.require_child_text(STUB_NS, "token")?.to_owned();
        Ok(())
    }

    fn duplicate_payload(&self) -> Box<dyn ResponsePayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 桩映射工厂：按动词本地名实例化 [`StubCheckCommand`]，响应只认 `pongData`。
pub struct NoopMappingFactory {
    descriptor: ServiceDescriptor,
}

impl NoopMappingFactory {
    /// 以命名空间构造工厂；解码路径应使用 [`STUB_NS`] 注册。
    pub fn new(namespace: &'static str) -> Self {
        Self {
            descriptor: ServiceDescriptor::new("stub", namespace, format!("{namespace} stub.xsd")),
        }
    }
}

impl MappingFactory for NoopMappingFactory {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn create_command(&self, element: &Element) -> Result<Command> {
        match CommandKind::from_tag(element.local_name()) {
            Some(kind) => Ok(Command::from_boxed(Box::new(StubCheckCommand::empty(kind)))),
            None => Err(EppError::malformed(format!(
                "`{}` is not a stub mapping command",
                element.local_name()
            ))),
        }
    }

    fn create_response(&self, element: &Element) -> Result<Response> {
        match element.local_name() {
            "pongData" => Ok(Response::for_payload(Box::new(StubPongData::default()))),
            other => Err(EppError::malformed(format!(
                "`{other}` is not a stub mapping response"
            ))),
        }
    }
}

/// 桩扩展：单 token 的 marker 元素。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerExtension {
    token: String,
}

impl MarkerExtension {
    /// 以 token 构造。
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// token 值。
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Component for MarkerExtension {
    fn encode(&self, _ctx: &EncodeContext<'_>) -> Result<Element> {
        Ok(Element::new(MARKER_NS, "marker")
            .with_child(Element::new(MARKER_NS, "token").with_text(self.token.clone())))
    }

    fn decode(&mut self, element: &Element, _ctx: &DecodeContext<'_>) -> Result<()> {
        self.token = element.require_child_text(MARKER_NS, "token")?.to_owned();
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

impl ExtensionComponent for MarkerExtension {
    fn namespace(&self) -> &str {
        MARKER_NS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn duplicate_extension(&self) -> Box<dyn ExtensionComponent> {
        Box::new(self.clone())
    }
}

/// 桩扩展工厂。
pub struct MarkerExtensionFactory {
    descriptor: ServiceDescriptor,
}

impl Default for MarkerExtensionFactory {
    fn default() -> Self {
        Self {
            descriptor: ServiceDescriptor::new("marker", MARKER_NS, "marker-1.0.xsd"),
        }
    }
}

impl ExtensionFactory for MarkerExtensionFactory {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn create_extension(&self, element: &Element) -> Result<Box<dyn ExtensionComponent>> {
        if !element.is_named(MARKER_NS, "marker") {
            return Err(EppError::malformed(format!(
                "`{}` is not a marker extension element",
                element.local_name()
            )));
        }
        Ok(Box::new(MarkerExtension::default()))
    }
}

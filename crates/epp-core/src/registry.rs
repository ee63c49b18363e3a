//! 扩展注册中心：命名空间到工厂的解码期分发表。
//!
//! # 设计目标（Why）
//! - 对象映射与协议扩展各自独立版本化、数量无上界；解码器若用集中式 `match`
//!   逐一枚举，每新增一份 Schema 都要回改核心。以命名空间为键的运行时分发表
//!   把“认识哪些映射”变成装配期决策，核心从此与具体 Schema 解耦；
//! - 注册只发生在进程启动期。本实现不内置锁：`register_*` 要求 `&mut self`，
//!   查询只要求 `&self`，借用检查在编译期阻止“边用边注册”；启动完成后将
//!   注册中心置入 `Arc` 共享即可安全地被多任务并发查询。
//!
//! # 使用方式（How）
//! - 每个映射 crate 暴露一个实现 [`MappingFactory`] 的工厂，启动期注册一次；
//! - 解码路径通过 [`ExtensionRegistry::create_command`] 等入口解析未知元素；
//! - [`ExtensionRegistry::services`] 枚举全部已注册能力，用于给新建的
//!   Login 命令播种本地能力全集。

use alloc::borrow::Cow;
use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::command::Command;
use crate::component::ExtensionComponent;
use crate::error::{EppError, NotFoundKind, Result};
use crate::response::Response;
use crate::xml::Element;

/// 服务描述符：一个映射/扩展对外公布的命名空间元数据。
///
/// # 契约说明（What）
/// - `namespace_uri` 是注册与协商的唯一键；
/// - `prefix` 与 `schema_location` 供文本层与 Schema 校验链路引用，
///   核心只原样保存。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
    prefix: Cow<'static, str>,
    namespace_uri: Cow<'static, str>,
    schema_location: Cow<'static, str>,
}

impl ServiceDescriptor {
    /// 构造服务描述符。
    pub fn new(
        prefix: impl Into<Cow<'static, str>>,
        namespace_uri: impl Into<Cow<'static, str>>,
        schema_location: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            namespace_uri: namespace_uri.into(),
            schema_location: schema_location.into(),
        }
    }

    /// 习惯用的命名空间前缀。
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 命名空间 URI，注册中心的查找键。
    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    /// `xsi:schemaLocation` 取值。
    pub fn schema_location(&self) -> &str {
        &self.schema_location
    }
}

/// 对象映射工厂：认领一个命令命名空间，负责实例化该映射的命令与响应。
pub trait MappingFactory: Send + Sync + 'static {
    /// 工厂认领的服务描述符。
    fn descriptor(&self) -> &ServiceDescriptor;

    /// 该映射额外依赖的 Schema 集合（默认无）。
    fn required_schemas(&self) -> Vec<Cow<'static, str>> {
        Vec::new()
    }

    /// 依据映射命名空间元素实例化对应的命令（载荷就位、尚未解码）。
    fn create_command(&self, element: &Element) -> Result<Command>;

    /// 依据映射命名空间元素实例化对应的响应（载荷就位、尚未解码）。
    fn create_response(&self, element: &Element) -> Result<Response>;
}

/// 协议扩展工厂：认领一个扩展命名空间。
pub trait ExtensionFactory: Send + Sync + 'static {
    /// 工厂认领的服务描述符。
    fn descriptor(&self) -> &ServiceDescriptor;

    /// 依据扩展元素实例化扩展组件（尚未解码）。
    fn create_extension(&self, element: &Element) -> Result<Box<dyn ExtensionComponent>>;
}

/// 命名空间索引的工厂注册中心。
///
/// # 契约说明（What）
/// - **注册**：幂等——同一命名空间重复注册是无操作，首个工厂生效；
/// - **查询**：`create_*` 未命中时返回带来源标记（command/response/extension）
///   的 `component_not_found` 错误，让调用方区分“缺 Schema”与“报文畸形”；
/// - **冻结**：注册需要独占借用，启动完成后以共享引用分发即自然只读。
#[derive(Default)]
pub struct ExtensionRegistry {
    mappings: BTreeMap<String, Box<dyn MappingFactory>>,
    extensions: BTreeMap<String, Box<dyn ExtensionFactory>>,
}

impl ExtensionRegistry {
    /// 构造空注册中心。
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册对象映射工厂；同命名空间重复注册为无操作。
    pub fn register_mapping(&mut self, factory: Box<dyn MappingFactory>) {
        let key = factory.descriptor().namespace_uri().to_owned();
        self.mappings.entry(key).or_insert(factory);
    }

    /// 注册协议扩展工厂；同命名空间重复注册为无操作。
    pub fn register_extension(&mut self, factory: Box<dyn ExtensionFactory>) {
        let key = factory.descriptor().namespace_uri().to_owned();
        self.extensions.entry(key).or_insert(factory);
    }

    /// 依据映射命名空间元素实例化命令。
    pub fn create_command(&self, element: &Element) -> Result<Command> {
        match self.mappings.get(element.namespace()) {
            Some(factory) => factory.create_command(element),
            None => Err(EppError::component_not_found(
                NotFoundKind::Command,
                element.namespace(),
            )),
        }
    }

    /// 依据映射命名空间元素实例化响应。
    pub fn create_response(&self, element: &Element) -> Result<Response> {
        match self.mappings.get(element.namespace()) {
            Some(factory) => factory.create_response(element),
            None => Err(EppError::component_not_found(
                NotFoundKind::Response,
                element.namespace(),
            )),
        }
    }

    /// 依据扩展块内的元素实例化扩展组件。
    pub fn create_extension(&self, element: &Element) -> Result<Box<dyn ExtensionComponent>> {
        match self.extensions.get(element.namespace()) {
            Some(factory) => factory.create_extension(element),
            None => Err(EppError::component_not_found(
                NotFoundKind::Extension,
                element.namespace(),
            )),
        }
    }

    /// 能力查询：对象映射命名空间是否已注册。
    pub fn has_service(&self, namespace: &str) -> bool {
        self.mappings.contains_key(namespace)
    }

    /// 能力查询：扩展命名空间是否已注册。
    pub fn has_extension_service(&self, namespace: &str) -> bool {
        self.extensions.contains_key(namespace)
    }

    /// 枚举全部已注册的对象服务描述符（按命名空间字典序）。
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.mappings.values().map(|factory| factory.descriptor())
    }

    /// 枚举全部已注册的扩展服务描述符（按命名空间字典序）。
    pub fn extension_services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.extensions.values().map(|factory| factory.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::test_stubs::{MarkerExtensionFactory, NoopMappingFactory};

    #[test]
    fn registration_is_idempotent_per_namespace() {
        // Why: 注册只发生在启动期且必须幂等；重复装配脚本不应悄悄替换工厂。
        let mut registry = ExtensionRegistry::new();
        registry.register_mapping(Box::new(NoopMappingFactory::new("urn:example:map-1.0")));
        registry.register_mapping(Box::new(NoopMappingFactory::new("urn:example:map-1.0")));
        assert_eq!(registry.services().count(), 1);
        assert!(registry.has_service("urn:example:map-1.0"));
        assert!(!registry.has_service("urn:example:other-1.0"));
    }

    #[test]
    fn unregistered_namespace_is_tagged_by_lookup_path() {
        // Why: 会话层依赖错误的 kind 标记区分缺失 Schema 的来源路径。
        let registry = ExtensionRegistry::new();
        let element = crate::xml::Element::new("urn:example:unknown-1.0", "check");

        let err = registry.create_command(&element).unwrap_err();
        assert_eq!(err.component_not_found_kind(), Some(NotFoundKind::Command));

        let err = registry.create_response(&element).unwrap_err();
        assert_eq!(err.component_not_found_kind(), Some(NotFoundKind::Response));

        let err = registry.create_extension(&element).unwrap_err();
        assert_eq!(err.code(), codes::COMPONENT_NOT_FOUND_EXTENSION);
        assert_eq!(err.component_not_found_kind(), Some(NotFoundKind::Extension));
    }

    #[test]
    fn services_enumerate_in_namespace_order() {
        // How: BTreeMap 保证枚举顺序确定，Login 播种结果因此可复现。
        let mut registry = ExtensionRegistry::new();
        registry.register_mapping(Box::new(NoopMappingFactory::new("urn:example:zeta-1.0")));
        registry.register_mapping(Box::new(NoopMappingFactory::new("urn:example:alpha-1.0")));
        registry.register_extension(Box::new(MarkerExtensionFactory::default()));
        let uris: alloc::vec::Vec<_> = registry.services().map(|d| d.namespace_uri().to_owned()).collect();
        assert_eq!(
            uris,
            alloc::vec![
                "urn:example:alpha-1.0".to_owned(),
                "urn:example:zeta-1.0".to_owned()
            ]
        );
        assert_eq!(registry.extension_services().count(), 1);
    }
}

//! 编解码组件契约：所有线上对象共同遵守的 encode/decode/duplicate 三件套。
//!
//! # 设计目标（Why）
//! - 命令、响应、问候语、扩展负载在线上形态各异，但都要满足同一条不变式：
//!   `decode(encode(x))` 复现 x 的全部可观察状态；把三个操作抽为统一契约，
//!   信封驱动器与注册中心才能以对象安全的方式组合任意映射；
//! - 注册中心是解码期唯一的共享状态，这里通过上下文参数显式注入，
//!   而不是进程级单例，保证核心可独立测试。
//!
//! # 契约说明（What）
//! - `encode` 在发出任何元素前完成快速校验，失败时点名缺失/越界的属性，
//!   绝不产出半成品元素；
//! - `decode` 在第一处缺陷即失败，不做部分恢复；失败后对象必须被丢弃；
//! - `duplicate` 是深拷贝：所有复合属性与集合元素都各自复制，绝不共享。

use alloc::boxed::Box;
use core::any::Any;

use crate::config::CodecConfig;
use crate::error::Result;
use crate::registry::ExtensionRegistry;
use crate::xml::Element;

/// 编码上下文：携带编码期可见的协商能力。
///
/// # 设计背景（Why）
/// - 多个映射在编码时需要判断某个可选特性（例如联系人关联）是否已被协商，
///   这一能力查询由注册中心回答；通过上下文传递避免映射直接持有注册中心。
#[derive(Clone, Copy)]
pub struct EncodeContext<'a> {
    registry: &'a ExtensionRegistry,
}

impl<'a> EncodeContext<'a> {
    /// 以注册中心引用构造编码上下文。
    pub fn new(registry: &'a ExtensionRegistry) -> Self {
        Self { registry }
    }

    /// 注册中心引用。
    pub fn registry(&self) -> &'a ExtensionRegistry {
        self.registry
    }

    /// 能力查询：给定对象映射命名空间是否已注册。
    pub fn has_service(&self, namespace: &str) -> bool {
        self.registry.has_service(namespace)
    }

    /// 能力查询：给定扩展命名空间是否已注册。
    pub fn has_extension_service(&self, namespace: &str) -> bool {
        self.registry.has_extension_service(namespace)
    }
}

/// 解码上下文：携带注册中心与运行策略。
///
/// # 契约说明（What）
/// - 信封驱动器解析 `<extension>` 块时通过 [`Self::registry`] 解析未知命名空间；
/// - [`CodecConfig`] 决定重复扩展的处置策略；
/// - 上下文按 `Copy` 语义传递，解码调用之间互不影响。
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    registry: &'a ExtensionRegistry,
    config: CodecConfig,
}

impl<'a> DecodeContext<'a> {
    /// 以默认策略构造解码上下文。
    pub fn new(registry: &'a ExtensionRegistry) -> Self {
        Self {
            registry,
            config: CodecConfig::default(),
        }
    }

    /// 以显式策略构造解码上下文。
    pub fn with_config(registry: &'a ExtensionRegistry, config: CodecConfig) -> Self {
        Self { registry, config }
    }

    /// 注册中心引用。
    pub fn registry(&self) -> &'a ExtensionRegistry {
        self.registry
    }

    /// 当前生效的策略快照。
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

/// 线上对象的统一编解码契约。
///
/// # 行为逻辑（How）
/// - `encode` 产出以自身为根的元素子树；
/// - `decode` 从给定元素恢复全部可观察状态；
/// - `duplicate` 产出可交给其他并发上下文独立使用的深拷贝。
///
/// # 风险提示（Trade-offs）
/// - 契约本身不含 `Clone` 约束，组件以 trait 对象形态在异构集合中流转，
///   深拷贝责任因此显式落在 `duplicate` 上。
pub trait Component: Send + Sync + 'static {
    /// 编码为元素子树；失败时返回点名字段的 Encode 错误。
    fn encode(&self, ctx: &EncodeContext<'_>) -> Result<Element>;

    /// 从元素子树恢复状态；失败时返回 Decode 错误。
    fn decode(&mut self, element: &Element, ctx: &DecodeContext<'_>) -> Result<()>;

    /// 深拷贝。
    fn duplicate(&self) -> Box<dyn Component>;
}

/// 扩展组件契约：可挂接在命令/响应上的独立命名空间负载。
///
/// # 设计背景（Why）
/// - 扩展集合是异构的；每个成员自报命名空间并暴露 `Any` 视图，
///   调用方按类型取用时无需在使用点做逐一匹配的向下转型分支。
pub trait ExtensionComponent: Component {
    /// 扩展自身的命名空间 URI。
    fn namespace(&self) -> &str;

    /// `Any` 视图，支撑类型化查询。
    fn as_any(&self) -> &dyn Any;

    /// 保持扩展类型的深拷贝。
    fn duplicate_extension(&self) -> Box<dyn ExtensionComponent>;
}

impl core::fmt::Debug for dyn ExtensionComponent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExtensionComponent")
            .field("namespace", &self.namespace())
            .finish()
    }
}

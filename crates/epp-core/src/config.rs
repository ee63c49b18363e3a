//! 编解码策略配置。
//!
//! # 设计目标（Why）
//! - “同一扩展类型是否允许重复”在不同注册局部署间并不一致，基础行为不应写死；
//!   将其建模为显式配置值，由会话层在装配期注入 [`crate::component::DecodeContext`]。
//! - 配置结构派生 `serde`，与部署侧的配置装载链路（TOML/JSON）无缝对接。

use serde::{Deserialize, Serialize};

/// 解码阶段对同命名空间扩展重复出现的处置策略。
///
/// # 契约说明（What）
/// - `Allow`：维持基础行为，重复扩展按文档顺序全部保留，
///   唯一性检查交由调用方的严格查询（`find_unique_extension`）按需触发；
/// - `Reject`：解码器在发现第二份同命名空间扩展时立即返回
///   `epp.extension.duplicate`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 保留全部扩展实例（默认）。
    #[default]
    Allow,
    /// 拒绝重复扩展并使本次解码失败。
    Reject,
}

/// 编解码器运行策略快照。
///
/// # 使用方式（How）
/// - 默认值即协议基础行为；
/// - 会话层可在进程装配期从配置文件反序列化出实例，再随
///   `DecodeContext` 注入所有解码调用。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// 扩展重复处置策略。
    pub duplicate_extensions: DuplicatePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_keeps_base_behaviour() {
        // Why: 基础行为是“允许重复”，默认值漂移会悄悄改变线上解码语义。
        assert_eq!(CodecConfig::default().duplicate_extensions, DuplicatePolicy::Allow);
    }

    #[cfg(feature = "std")]
    #[test]
    fn config_deserializes_with_defaults() {
        // How: 缺省字段回落默认值，保证配置文件可以按需增量声明。
        let config: CodecConfig = serde_json::from_str("{}").expect("empty object parses");
        assert_eq!(config.duplicate_extensions, DuplicatePolicy::Allow);

        let rejecting: CodecConfig =
            serde_json::from_str(r#"{"duplicate_extensions":"reject"}"#).expect("policy parses");
        assert_eq!(rejecting.duplicate_extensions, DuplicatePolicy::Reject);
    }
}

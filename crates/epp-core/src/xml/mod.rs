//! 内存 XML 元素树：所有编解码契约的交换类型。
//!
//! # 设计目标（Why）
//! - 编解码层是同步、无 I/O 的纯数据变换，契约双方只需要一个带命名空间的元素树，
//!   不需要绑定任何具体的 XML 解析器；
//! - 属性与子元素保持插入顺序，满足 Schema 对元素排序的硬性要求，也让
//!   `decode(encode(x))` 的可观察状态对比保持确定性。
//!
//! # 使用方式（How）
//! - 构造走 Builder 风格（`with_text`、`with_attribute`、`with_child`）；
//! - 解码侧通过 `require_*` 系列查询在第一处缺陷即返回 `epp.decode.malformed`；
//! - 文本序列化位于 [`text`] 子模块，仅在 `std` Feature 下编译。
//!
//! # 契约说明（What）
//! - 元素等价性即 `PartialEq`：命名空间、本地名、属性序列、子元素序列与文本逐项相等；
//! - `xmlns`/`xmlns:*` 声明不是模型的一部分，读取文本时折叠进命名空间字段。

use alloc::borrow::Cow;
use alloc::borrow::ToOwned;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{EppError, Result};

#[cfg(feature = "std")]
pub mod text;

/// 协议固定命名空间与保留属性名。
pub mod ns {
    /// EPP 核心信封命名空间，承载 `command`/`response`/`greeting` 等元素。
    pub const EPP: &str = "urn:ietf:params:xml:ns:epp-1.0";
    /// XML Schema Instance 命名空间，`schemaLocation` 属性的宿主。
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    /// 映射根元素按需携带的 Schema 位置属性（含 `xsi:` 前缀的字面名）。
    pub const SCHEMA_LOCATION_ATTR: &str = "xsi:schemaLocation";
}

/// 带命名空间的 XML 元素节点。
///
/// # 契约说明（What）
/// - `namespace` + `local` 构成元素身份；属性名保持书写时的字面形态
///   （例如 `xsi:schemaLocation`），属性值已完成实体解码；
/// - 子元素与属性都按插入顺序存放，编码器产出的顺序就是线上顺序；
/// - 文本与子元素可以共存，但 EPP Schema 实际只会二选一。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    namespace: Cow<'static, str>,
    local: Cow<'static, str>,
    attributes: Vec<(Cow<'static, str>, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    /// 以命名空间与本地名构造空元素。
    pub fn new(namespace: impl Into<Cow<'static, str>>, local: impl Into<Cow<'static, str>>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Builder：设置文本内容。
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder：追加一个属性。
    pub fn with_attribute(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder：追加一个子元素。
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Builder：批量追加子元素，保持迭代顺序。
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// 就地追加子元素。
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// 就地写入属性；同名属性被覆盖，位置保持首次出现处。
    pub fn set_attribute(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// 就地设置文本内容。
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// 元素命名空间 URI。
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 元素本地名。
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// 判断元素是否具有给定身份。
    pub fn is_named(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }

    /// 按字面名查询属性值。
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// 属性序列快照，按插入顺序。
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_ref(), v.as_str()))
    }

    /// 必填属性查询；缺失即返回 `epp.decode.malformed`。
    pub fn require_attribute(&self, name: &str) -> Result<&str> {
        self.attribute(name).ok_or_else(|| {
            EppError::malformed(format!(
                "element <{}> is missing required attribute `{name}`",
                self.local
            ))
        })
    }

    /// 子元素序列。
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// 首个子元素。
    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    /// 查找首个具有给定身份的子元素。
    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.is_named(namespace, local))
    }

    /// 迭代所有具有给定身份的子元素，保持文档顺序。
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |c| c.is_named(namespace, local))
    }

    /// 必填子元素查询；缺失即返回 `epp.decode.malformed`。
    pub fn require_child(&self, namespace: &str, local: &str) -> Result<&Element> {
        self.child(namespace, local).ok_or_else(|| {
            EppError::malformed(format!(
                "element <{}> is missing required child <{local}>",
                self.local
            ))
        })
    }

    /// 文本内容。
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// 必填文本查询；缺失即返回 `epp.decode.malformed`。
    pub fn require_text(&self) -> Result<&str> {
        self.text().ok_or_else(|| {
            EppError::malformed(format!("element <{}> is missing text content", self.local))
        })
    }

    /// 便捷查询：子元素文本。
    pub fn child_text(&self, namespace: &str, local: &str) -> Option<&str> {
        self.child(namespace, local).and_then(Element::text)
    }

    /// 便捷查询：必填子元素文本。
    pub fn require_child_text(&self, namespace: &str, local: &str) -> Result<&str> {
        self.require_child(namespace, local)?.require_text()
    }

    /// 便捷查询：子元素文本的拥有型副本。
    pub fn child_text_owned(&self, namespace: &str, local: &str) -> Option<String> {
        self.child_text(namespace, local).map(ToOwned::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_child_and_attribute_order() {
        // Why: Schema 强制元素排序，模型若重排子元素会直接破坏线上合法性。
        let el = Element::new(ns::EPP, "command")
            .with_attribute("a", "1")
            .with_attribute("b", "2")
            .with_child(Element::new(ns::EPP, "first"))
            .with_child(Element::new(ns::EPP, "second"));
        let attrs: alloc::vec::Vec<_> = el.attributes().collect();
        assert_eq!(attrs, alloc::vec![("a", "1"), ("b", "2")]);
        assert_eq!(el.children()[0].local_name(), "first");
        assert_eq!(el.children()[1].local_name(), "second");
    }

    #[test]
    fn set_attribute_overwrites_in_place() {
        // Why: 编码驱动会在 hook 产出的元素上补写 `op` 属性，覆盖语义必须稳定。
        let mut el = Element::new(ns::EPP, "transfer");
        el.set_attribute("op", "query");
        el.set_attribute("op", "request");
        assert_eq!(el.attribute("op"), Some("request"));
        assert_eq!(el.attributes().count(), 1);
    }

    #[test]
    fn require_child_reports_malformed() {
        let el = Element::new(ns::EPP, "response");
        let err = el.require_child(ns::EPP, "result").unwrap_err();
        assert_eq!(err.code(), crate::error::codes::DECODE_MALFORMED);
        assert!(err.message().contains("result"));
    }

    #[test]
    fn children_named_keeps_document_order() {
        let el = Element::new(ns::EPP, "svcMenu")
            .with_child(Element::new(ns::EPP, "version").with_text("1.0"))
            .with_child(Element::new(ns::EPP, "lang").with_text("en"))
            .with_child(Element::new(ns::EPP, "version").with_text("0.9"));
        let versions: alloc::vec::Vec<_> = el
            .children_named(ns::EPP, "version")
            .filter_map(Element::text)
            .collect();
        assert_eq!(versions, alloc::vec!["1.0", "0.9"]);
    }
}

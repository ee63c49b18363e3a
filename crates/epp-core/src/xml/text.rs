//! XML 文本层：元素树与线上字节之间的读写桥（仅 `std`）。
//!
//! # 设计目标（Why）
//! - 核心契约只面向内存元素树；文本化是传输边界的职责，因此整个模块挂在
//!   `std` Feature 之下，由 `quick-xml` 承担事件流解析与实体转义；
//! - 命名空间采用“默认声明”策略：每逢命名空间边界（子元素与父元素不同命名空间）
//!   写出一次 `xmlns`，避免维护前缀映射表。
//!
//! # 契约说明（What）
//! - `write_document(read_document(s))` 不保证字节级相等，但
//!   `read_document(write_document(tree)) == tree` 对任意合法元素树成立；
//! - `xmlns`/`xmlns:*` 声明在读取时折叠进命名空间字段，不会出现在属性序列中；
//! - 带 `xsi:` 前缀的属性（如 `xsi:schemaLocation`）按字面名保留，写出时自动补
//!   `xmlns:xsi` 声明。

use alloc::borrow::ToOwned;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;

use super::{Element, ns};
use crate::error::{EppError, Result, codes};

fn read_err(err: impl fmt::Display) -> EppError {
    EppError::new(codes::XML_READ, format!("xml read failed: {err}"))
}

fn write_err(err: impl fmt::Display) -> EppError {
    EppError::new(codes::XML_WRITE, format!("xml write failed: {err}"))
}

/// 将元素树序列化为完整的 XML 文档文本。
///
/// # 行为逻辑（How）
/// - 先写固定声明头，再对根元素做深度优先写出；
/// - 无子元素且无文本的元素写作自闭合形态；
/// - 文本内容交由 `quick-xml` 完成实体转义。
pub fn write_document(root: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
        .map_err(write_err)?;
    write_element(&mut writer, root, "")?;
    String::from_utf8(writer.into_inner())
        .map_err(|err| EppError::new(codes::XML_WRITE, "writer produced invalid UTF-8").with_cause(err))
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    parent_namespace: &str,
) -> Result<()> {
    let mut start = BytesStart::new(element.local_name());
    if element.namespace() != parent_namespace {
        start.push_attribute(("xmlns", element.namespace()));
    }
    if element.attributes().any(|(name, _)| name.starts_with("xsi:")) {
        start.push_attribute(("xmlns:xsi", ns::XSI));
    }
    for (name, value) in element.attributes() {
        start.push_attribute((name, value));
    }

    if element.children().is_empty() && element.text().is_none() {
        writer.write_event(Event::Empty(start)).map_err(write_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_err)?;
    if let Some(text) = element.text() {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_err)?;
    }
    for child in element.children() {
        write_element(writer, child, element.namespace())?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.local_name())))
        .map_err(write_err)?;
    Ok(())
}

/// 将 XML 文档文本解析为元素树。
///
/// # 行为逻辑（How）
/// - 借助 `NsReader` 解析事件流并逐元素解析命名空间；
/// - 维护一个显式元素栈：`Start` 压栈、`End` 弹栈挂回父元素、`Empty` 直接挂接；
/// - 元素间的排版空白被丢弃，真实文本内容去除首尾空白后保留。
///
/// # 契约说明（What）
/// - 任何语法错误、未知前缀或多根文档都返回 `epp.xml.read`；
/// - 成功时返回文档唯一的根元素。
pub fn read_document(input: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolve, event) = reader.read_resolved_event().map_err(read_err)?;
        match event {
            Event::Start(start) => {
                let element = element_from_start(resolve, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from_start(resolve, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(read_err)?;
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let Some(current) = stack.last_mut() else {
                    return Err(EppError::new(
                        codes::XML_READ,
                        "text content outside of the document root",
                    ));
                };
                let merged = match current.text() {
                    Some(existing) => {
                        let mut buf = String::from(existing);
                        buf.push_str(trimmed);
                        buf
                    }
                    None => String::from(trimmed),
                };
                current.set_text(merged);
            }
            Event::End(_) => {
                // 标签配对由 `quick-xml` 保证，这里栈空即输入已被判定非法。
                let Some(element) = stack.pop() else {
                    return Err(EppError::new(codes::XML_READ, "unbalanced end tag"));
                };
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| EppError::new(codes::XML_READ, "document contains no root element"))
}

fn element_from_start(resolve: ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Element> {
    let namespace = match resolve {
        ResolveResult::Bound(bound) => core::str::from_utf8(bound.into_inner())
            .map_err(read_err)?
            .to_owned(),
        ResolveResult::Unbound => String::new(),
        ResolveResult::Unknown(prefix) => {
            return Err(EppError::new(
                codes::XML_READ,
                format!(
                    "unknown namespace prefix `{}`",
                    String::from_utf8_lossy(&prefix)
                ),
            ));
        }
    };
    let local = core::str::from_utf8(start.local_name().as_ref())
        .map_err(read_err)?
        .to_owned();

    let mut element = Element::new(namespace, local);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(read_err)?;
        let key = attribute.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let name = core::str::from_utf8(key).map_err(read_err)?.to_owned();
        let value = attribute.unescape_value().map_err(read_err)?.into_owned();
        element.set_attribute(name, value);
    }
    Ok(element)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None => {
            if root.is_some() {
                return Err(EppError::new(
                    codes::XML_READ,
                    "document contains more than one root element",
                ));
            }
            *root = Some(element);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Element {
        Element::new(ns::EPP, "epp").with_child(
            Element::new(ns::EPP, "command")
                .with_child(
                    Element::new(ns::EPP, "check").with_child(
                        Element::new("urn:example:map-1.0", "check")
                            .with_attribute(ns::SCHEMA_LOCATION_ATTR, "urn:example:map-1.0 map-1.0.xsd")
                            .with_child(
                                Element::new("urn:example:map-1.0", "name").with_text("a&b.example"),
                            ),
                    ),
                )
                .with_child(Element::new(ns::EPP, "clTRID").with_text("ABC-12345")),
        )
    }

    #[test]
    fn tree_survives_text_round_trip() {
        // Why: 核心不保证字节级稳定，但元素树经文本层往返必须逐项相等，
        //      这也是所有上层 round-trip 性质的地基。
        let tree = sample_tree();
        let text = write_document(&tree).expect("write succeeds");
        let reparsed = read_document(&text).expect("read succeeds");
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn namespace_declarations_fold_into_namespace_field() {
        let tree = sample_tree();
        let text = write_document(&tree).expect("write succeeds");
        // How: 文本里应有两处默认命名空间声明（epp 根与映射边界），但解析回的
        //      属性序列里不允许出现 xmlns。
        assert!(text.contains("xmlns=\"urn:ietf:params:xml:ns:epp-1.0\""));
        assert!(text.contains("xmlns=\"urn:example:map-1.0\""));
        let reparsed = read_document(&text).expect("read succeeds");
        let command = reparsed.require_child(ns::EPP, "command").unwrap();
        assert!(command.attributes().count() == 0);
    }

    #[test]
    fn xsi_prefixed_attribute_round_trips_literally() {
        let tree = sample_tree();
        let text = write_document(&tree).expect("write succeeds");
        assert!(text.contains("xmlns:xsi"));
        let reparsed = read_document(&text).expect("read succeeds");
        let mapping = reparsed
            .require_child(ns::EPP, "command")
            .and_then(|c| c.require_child(ns::EPP, "check"))
            .and_then(|c| c.require_child("urn:example:map-1.0", "check"))
            .unwrap();
        assert_eq!(
            mapping.attribute(ns::SCHEMA_LOCATION_ATTR),
            Some("urn:example:map-1.0 map-1.0.xsd")
        );
    }

    #[test]
    fn escaped_text_is_unescaped_on_read() {
        let tree = sample_tree();
        let text = write_document(&tree).expect("write succeeds");
        assert!(text.contains("a&amp;b.example"));
        let reparsed = read_document(&text).expect("read succeeds");
        let name = reparsed
            .require_child(ns::EPP, "command")
            .and_then(|c| c.require_child(ns::EPP, "check"))
            .and_then(|c| c.require_child("urn:example:map-1.0", "check"))
            .and_then(|c| c.require_child("urn:example:map-1.0", "name"))
            .unwrap();
        assert_eq!(name.text(), Some("a&b.example"));
    }

    #[test]
    fn malformed_input_reports_read_error() {
        let err = read_document("<epp xmlns=\"urn:ietf:params:xml:ns:epp-1.0\"><command></epp>")
            .unwrap_err();
        assert_eq!(err.code(), codes::XML_READ);
    }
}

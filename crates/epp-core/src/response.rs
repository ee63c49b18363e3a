//! 响应信封、结果模型与消息队列描述符。
//!
//! # 设计目标（Why）
//! - 响应在命令信封的基础上追加三类不变结构：一至多个结果、可选的消息队列
//!   描述符、事务号对（回显的客户端号 + 服务端号）；映射相关的数据块仍旧
//!   通过钩子下沉，驱动器负责 `<resData>` 包装与顺序；
//! - “成功”谓词是会话层分支的依据，必须收敛为单一实现：
//!   恰有一个结果且其代码落在成功子区间。
//!
//! # 契约说明（What）
//! - 编码顺序固定：`result+` → `msgQ?` → `resData?` → `extension?` → `trID`；
//! - 结果代码是 [1000, 9999] 的整数，成功子区间为 [1000, 2000)；
//! - 结果顺序在编解码两侧都保持文档顺序。

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::component::{Component, DecodeContext, EncodeContext, ExtensionComponent};
use crate::config::DuplicatePolicy;
use crate::error::{EppError, Result, codes};
use crate::message::Message;
use crate::xml::{Element, ns};

/// RFC 5730 定义的结果代码常量表。
///
/// # 契约说明（What）
/// - 常量值是线上契约，禁止复用数值另作他义；
/// - 成功子区间判定统一走 [`is_success`]。
pub mod result_codes {
    /// 命令成功完成。
    pub const SUCCESS: u16 = 1000;
    /// 命令成功，动作待定（异步完成）。
    pub const SUCCESS_ACTION_PENDING: u16 = 1001;
    /// 队列中暂无消息。
    pub const SUCCESS_NO_MESSAGES: u16 = 1300;
    /// 命令成功，确认后出队。
    pub const SUCCESS_ACK_TO_DEQUEUE: u16 = 1301;
    /// 命令成功，会话结束。
    pub const SUCCESS_ENDING_SESSION: u16 = 1500;
    /// 未知命令。
    pub const UNKNOWN_COMMAND: u16 = 2000;
    /// 命令语法错误。
    pub const COMMAND_SYNTAX_ERROR: u16 = 2001;
    /// 命令使用错误。
    pub const COMMAND_USE_ERROR: u16 = 2002;
    /// 缺少必需参数。
    pub const REQUIRED_PARAMETER_MISSING: u16 = 2003;
    /// 参数取值越界。
    pub const PARAMETER_VALUE_RANGE_ERROR: u16 = 2004;
    /// 参数取值语法错误。
    pub const PARAMETER_VALUE_SYNTAX_ERROR: u16 = 2005;
    /// 协议版本未实现。
    pub const UNIMPLEMENTED_PROTOCOL_VERSION: u16 = 2100;
    /// 命令未实现。
    pub const UNIMPLEMENTED_COMMAND: u16 = 2101;
    /// 命令选项未实现。
    pub const UNIMPLEMENTED_OPTION: u16 = 2102;
    /// 扩展未实现。
    pub const UNIMPLEMENTED_EXTENSION: u16 = 2103;
    /// 计费失败。
    pub const BILLING_FAILURE: u16 = 2104;
    /// 对象不符合续期条件。
    pub const OBJECT_NOT_ELIGIBLE_FOR_RENEWAL: u16 = 2105;
    /// 对象不符合转移条件。
    pub const OBJECT_NOT_ELIGIBLE_FOR_TRANSFER: u16 = 2106;
    /// 认证失败。
    pub const AUTHENTICATION_ERROR: u16 = 2200;
    /// 授权失败。
    pub const AUTHORIZATION_ERROR: u16 = 2201;
    /// 授权信息无效。
    pub const INVALID_AUTHORIZATION_INFORMATION: u16 = 2202;
    /// 对象处于待转移状态。
    pub const OBJECT_PENDING_TRANSFER: u16 = 2300;
    /// 对象不处于待转移状态。
    pub const OBJECT_NOT_PENDING_TRANSFER: u16 = 2301;
    /// 对象已存在。
    pub const OBJECT_EXISTS: u16 = 2302;
    /// 对象不存在。
    pub const OBJECT_DOES_NOT_EXIST: u16 = 2303;
    /// 对象状态禁止该操作。
    pub const OBJECT_STATUS_PROHIBITS_OPERATION: u16 = 2304;
    /// 对象关联禁止该操作。
    pub const OBJECT_ASSOCIATION_PROHIBITS_OPERATION: u16 = 2305;
    /// 参数取值违反策略。
    pub const PARAMETER_VALUE_POLICY_ERROR: u16 = 2306;
    /// 对象服务未实现。
    pub const UNIMPLEMENTED_OBJECT_SERVICE: u16 = 2307;
    /// 违反数据管理策略。
    pub const DATA_MANAGEMENT_POLICY_VIOLATION: u16 = 2308;
    /// 命令执行失败。
    pub const COMMAND_FAILED: u16 = 2400;
    /// 命令失败，服务端即将关闭连接。
    pub const COMMAND_FAILED_SERVER_CLOSING_CONNECTION: u16 = 2500;
    /// 认证失败，服务端即将关闭连接。
    pub const AUTHENTICATION_ERROR_SERVER_CLOSING_CONNECTION: u16 = 2501;
    /// 会话数超限，服务端即将关闭连接。
    pub const SESSION_LIMIT_EXCEEDED_SERVER_CLOSING_CONNECTION: u16 = 2502;

    /// 代码是否落在成功子区间 [1000, 2000)。
    pub const fn is_success(code: u16) -> bool {
        code >= 1000 && code < 2000
    }

    /// 代码是否落在协议约定的合法区间 [1000, 9999]。
    pub const fn is_in_protocol_range(code: u16) -> bool {
        code >= 1000 && code <= 9999
    }
}

/// 结果附带的扩展诊断值：一个任意命名空间的元素加一段人类可读原因。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtValue {
    value: Element,
    reason: String,
    reason_lang: Option<String>,
}

impl ExtValue {
    /// 构造扩展诊断值。
    pub fn new(value: Element, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: reason.into(),
            reason_lang: None,
        }
    }

    /// Builder：设置原因文本的语言标签。
    pub fn with_reason_lang(mut self, lang: impl Into<String>) -> Self {
        self.reason_lang = Some(lang.into());
        self
    }

    /// 被诊断的元素。
    pub fn value(&self) -> &Element {
        &self.value
    }

    /// 人类可读原因。
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// 单个命令结果：代码、文本与可选的结构化诊断值。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EppResult {
    code: u16,
    message: String,
    lang: String,
    values: Vec<Element>,
    ext_values: Vec<ExtValue>,
}

impl EppResult {
    /// 以代码与文本构造结果，语言默认 `en`。
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            lang: String::from("en"),
            values: Vec::new(),
            ext_values: Vec::new(),
        }
    }

    /// Builder：设置语言标签。
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Builder：追加一个结构化诊断值。
    pub fn with_value(mut self, value: Element) -> Self {
        self.values.push(value);
        self
    }

    /// Builder：追加一个带原因的诊断值。
    pub fn with_ext_value(mut self, ext_value: ExtValue) -> Self {
        self.ext_values.push(ext_value);
        self
    }

    /// 结果代码。
    pub fn code(&self) -> u16 {
        self.code
    }

    /// 结果文本。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 语言标签。
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// 结构化诊断值序列。
    pub fn values(&self) -> &[Element] {
        &self.values
    }

    /// 带原因的诊断值序列。
    pub fn ext_values(&self) -> &[ExtValue] {
        &self.ext_values
    }

    /// 代码是否属于成功子区间。
    pub fn is_success(&self) -> bool {
        result_codes::is_success(self.code)
    }

    fn encode(&self) -> Result<Element> {
        if !result_codes::is_in_protocol_range(self.code) {
            return Err(EppError::new(
                codes::ENCODE_OUT_OF_RANGE,
                format!("result code {} is outside [1000, 9999]", self.code),
            ));
        }
        let mut result =
            Element::new(ns::EPP, "result").with_attribute("code", self.code.to_string());
        let mut msg = Element::new(ns::EPP, "msg").with_text(self.message.clone());
        if self.lang != "en" {
            msg.set_attribute("lang", self.lang.clone());
        }
        result.push_child(msg);
        for value in &self.values {
            result.push_child(Element::new(ns::EPP, "value").with_child(value.clone()));
        }
        for ext_value in &self.ext_values {
            let mut reason = Element::new(ns::EPP, "reason").with_text(ext_value.reason.clone());
            if let Some(lang) = &ext_value.reason_lang {
                reason.set_attribute("lang", lang.clone());
            }
            result.push_child(
                Element::new(ns::EPP, "extValue")
                    .with_child(Element::new(ns::EPP, "value").with_child(ext_value.value.clone()))
                    .with_child(reason),
            );
        }
        Ok(result)
    }

    fn decode(element: &Element) -> Result<Self> {
        let code: u16 = element
            .require_attribute("code")?
            .parse()
            .map_err(|_| EppError::malformed("result code is not an integer"))?;
        if !result_codes::is_in_protocol_range(code) {
            return Err(EppError::new(
                codes::DECODE_OUT_OF_RANGE,
                format!("result code {code} is outside [1000, 9999]"),
            ));
        }
        let msg = element.require_child(ns::EPP, "msg")?;
        let mut result = EppResult::new(code, msg.text().unwrap_or_default());
        if let Some(lang) = msg.attribute("lang") {
            result.lang = lang.to_owned();
        }
        for value in element.children_named(ns::EPP, "value") {
            let inner = value
                .first_child()
                .ok_or_else(|| EppError::malformed("result value carries no element"))?;
            result.values.push(inner.clone());
        }
        for ext_value in element.children_named(ns::EPP, "extValue") {
            let inner = ext_value
                .require_child(ns::EPP, "value")?
                .first_child()
                .ok_or_else(|| EppError::malformed("extValue carries no element"))?;
            let reason = ext_value.require_child(ns::EPP, "reason")?;
            let mut decoded = ExtValue::new(inner.clone(), reason.text().unwrap_or_default());
            if let Some(lang) = reason.attribute("lang") {
                decoded.reason_lang = Some(lang.to_owned());
            }
            result.ext_values.push(decoded);
        }
        Ok(result)
    }
}

/// 消息队列描述符：轮询响应携带的队列快照。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageQueue {
    count: u64,
    id: String,
    enqueue_date: Option<DateTime<Utc>>,
    message: Option<String>,
}

impl MessageQueue {
    /// 以队列长度与队首消息标识构造描述符。
    pub fn new(count: u64, id: impl Into<String>) -> Self {
        Self {
            count,
            id: id.into(),
            enqueue_date: None,
            message: None,
        }
    }

    /// Builder：设置入队时间。
    pub fn with_enqueue_date(mut self, date: DateTime<Utc>) -> Self {
        self.enqueue_date = Some(date);
        self
    }

    /// Builder：设置人类可读消息文本。
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 队列中的消息数。
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 队首消息标识。
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 入队时间。
    pub fn enqueue_date(&self) -> Option<DateTime<Utc>> {
        self.enqueue_date
    }

    /// 消息文本。
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn encode(&self) -> Result<Element> {
        if self.id.is_empty() {
            return Err(EppError::missing_attribute("msgQ id"));
        }
        let mut queue = Element::new(ns::EPP, "msgQ")
            .with_attribute("count", self.count.to_string())
            .with_attribute("id", self.id.clone());
        if let Some(date) = self.enqueue_date {
            queue.push_child(
                Element::new(ns::EPP, "qDate")
                    .with_text(date.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        if let Some(message) = &self.message {
            queue.push_child(Element::new(ns::EPP, "msg").with_text(message.clone()));
        }
        Ok(queue)
    }

    fn decode(element: &Element) -> Result<Self> {
        let count: u64 = element
            .require_attribute("count")?
            .parse()
            .map_err(|_| EppError::malformed("msgQ count is not an integer"))?;
        let id = element.require_attribute("id")?.to_owned();
        let mut queue = MessageQueue::new(count, id);
        if let Some(text) = element.child_text(ns::EPP, "qDate") {
            let parsed = DateTime::parse_from_rfc3339(text).map_err(|err| {
                EppError::malformed(format!("msgQ qDate `{text}` is not RFC 3339: {err}"))
            })?;
            queue.enqueue_date = Some(parsed.with_timezone(&Utc));
        }
        queue.message = element.child_text_owned(ns::EPP, "msg");
        Ok(queue)
    }
}

/// 事务号对：回显的客户端号与服务端分配号。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionId {
    client: Option<String>,
    server: String,
}

impl TransactionId {
    /// 以服务端事务号构造。
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            client: None,
            server: server.into(),
        }
    }

    /// Builder：设置回显的客户端事务号。
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// 回显的客户端事务号。
    pub fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }

    /// 服务端事务号。
    pub fn server(&self) -> &str {
        &self.server
    }
}

/// 响应载荷钩子：映射的 `<resData>` 数据块。
pub trait ResponsePayload: Send + Sync + 'static {
    /// 载荷所属命名空间。
    fn namespace(&self) -> &str;

    /// 产出 `<resData>` 之内的映射数据元素。
    fn encode_payload(&self, ctx: &EncodeContext<'_>) -> Result<Element>;

    /// 从映射数据元素恢复载荷状态。
    fn decode_payload(&mut self, element: &Element, ctx: &DecodeContext<'_>) -> Result<()>;

    /// 保持载荷类型的深拷贝。
    fn duplicate_payload(&self) -> Box<dyn ResponsePayload>;

    /// `Any` 视图，支撑解码后按具体类型取回载荷。
    fn as_any(&self) -> &dyn Any;
}

/// 响应信封：服务端发往客户端的完整消息。
pub struct Response {
    results: Vec<EppResult>,
    message_queue: Option<MessageQueue>,
    payload: Option<Box<dyn ResponsePayload>>,
    extensions: Vec<Box<dyn ExtensionComponent>>,
    transaction_id: TransactionId,
}

impl core::fmt::Debug for Response {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Response")
            .field("results", &self.results)
            .field("message_queue", &self.message_queue)
            .field("has_payload", &self.payload.is_some())
            .field("extensions", &self.extensions.len())
            .field("transaction_id", &self.transaction_id)
            .finish()
    }
}

impl Response {
    /// 以首个结果与服务端事务号构造响应。
    pub fn new(result: EppResult, server_transaction_id: impl Into<String>) -> Self {
        Self {
            results: alloc::vec![result],
            message_queue: None,
            payload: None,
            extensions: Vec::new(),
            transaction_id: TransactionId::new(server_transaction_id),
        }
    }

    /// 工厂路径：构造载荷就位、等待解码的空壳响应。
    ///
    /// 结果列表与事务号由随后的模板解码填充；对空壳直接编码会因缺失
    /// 结果而失败，这正是“编码快速失败”契约的体现。
    pub fn for_payload(payload: Box<dyn ResponsePayload>) -> Self {
        Self {
            results: Vec::new(),
            message_queue: None,
            payload: Some(payload),
            extensions: Vec::new(),
            transaction_id: TransactionId::default(),
        }
    }

    /// 追加一个结果，保持顺序。
    pub fn push_result(&mut self, result: EppResult) {
        self.results.push(result);
    }

    /// 结果序列（文档顺序）。
    pub fn results(&self) -> &[EppResult] {
        &self.results
    }

    /// 成功谓词：恰有一个结果且其代码落在成功子区间。
    pub fn is_success(&self) -> bool {
        match self.results.as_slice() {
            [only] => only.is_success(),
            _ => false,
        }
    }

    /// 消息队列描述符。
    pub fn message_queue(&self) -> Option<&MessageQueue> {
        self.message_queue.as_ref()
    }

    /// Builder：设置消息队列描述符。
    pub fn with_message_queue(mut self, queue: MessageQueue) -> Self {
        self.message_queue = Some(queue);
        self
    }

    /// Builder：设置映射载荷。
    pub fn with_payload(mut self, payload: impl ResponsePayload) -> Self {
        self.payload = Some(Box::new(payload));
        self
    }

    /// 映射载荷的只读视图。
    pub fn payload(&self) -> Option<&dyn ResponsePayload> {
        self.payload.as_deref()
    }

    /// 按具体类型取回映射载荷。
    pub fn payload_as<T: ResponsePayload>(&self) -> Option<&T> {
        self.payload
            .as_deref()
            .and_then(|payload| payload.as_any().downcast_ref::<T>())
    }

    /// 挂接一个扩展，保持挂接顺序。
    pub fn attach_extension(&mut self, extension: Box<dyn ExtensionComponent>) {
        self.extensions.push(extension);
    }

    /// Builder：挂接一个扩展。
    pub fn with_extension(mut self, extension: Box<dyn ExtensionComponent>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// 已挂接的扩展序列（文档顺序）。
    pub fn extensions(&self) -> &[Box<dyn ExtensionComponent>] {
        &self.extensions
    }

    /// 按类型查找首个扩展。
    pub fn find_extension<T: ExtensionComponent>(&self) -> Option<&T> {
        self.extensions
            .iter()
            .find_map(|extension| extension.as_any().downcast_ref::<T>())
    }

    /// 按类型查找扩展并要求唯一（语义同 [`crate::command::Command::find_unique_extension`]）。
    pub fn find_unique_extension<T: ExtensionComponent>(&self) -> Result<Option<&T>> {
        let mut found: Option<&T> = None;
        for extension in &self.extensions {
            if let Some(typed) = extension.as_any().downcast_ref::<T>() {
                if found.is_some() {
                    return Err(EppError::duplicate_extension(extension.namespace()));
                }
                found = Some(typed);
            }
        }
        Ok(found)
    }

    /// 事务号对。
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Builder：设置回显的客户端事务号。
    pub fn with_client_transaction_id(mut self, client: impl Into<String>) -> Self {
        self.transaction_id.client = Some(client.into());
        self
    }

    /// 深拷贝：结果、载荷与扩展都各自复制。
    pub fn duplicate(&self) -> Response {
        Response {
            results: self.results.clone(),
            message_queue: self.message_queue.clone(),
            payload: self
                .payload
                .as_deref()
                .map(ResponsePayload::duplicate_payload),
            extensions: self
                .extensions
                .iter()
                .map(|extension| extension.duplicate_extension())
                .collect(),
            transaction_id: self.transaction_id.clone(),
        }
    }
}

impl Component for Response {
    fn encode(&self, ctx: &EncodeContext<'_>) -> Result<Element> {
        if self.results.is_empty() {
            return Err(EppError::missing_attribute("result"));
        }
        if self.transaction_id.server.is_empty() {
            return Err(EppError::missing_attribute("svTRID"));
        }

        let mut response = Element::new(ns::EPP, "response");
        for result in &self.results {
            response.push_child(result.encode()?);
        }
        if let Some(queue) = &self.message_queue {
            response.push_child(queue.encode()?);
        }
        if let Some(payload) = &self.payload {
            let data = payload.encode_payload(ctx)?;
            response.push_child(Element::new(ns::EPP, "resData").with_child(data));
        }
        if !self.extensions.is_empty() {
            let mut block = Element::new(ns::EPP, "extension");
            for extension in &self.extensions {
                block.push_child(extension.encode(ctx)?);
            }
            response.push_child(block);
        }

        let mut trid = Element::new(ns::EPP, "trID");
        if let Some(client) = &self.transaction_id.client {
            trid.push_child(Element::new(ns::EPP, "clTRID").with_text(client.clone()));
        }
        trid.push_child(
            Element::new(ns::EPP, "svTRID").with_text(self.transaction_id.server.clone()),
        );
        response.push_child(trid);

        Ok(Element::new(ns::EPP, "epp").with_child(response))
    }

    fn decode(&mut self, element: &Element, ctx: &DecodeContext<'_>) -> Result<()> {
        let response = element.require_child(ns::EPP, "response")?;

        self.results = response
            .children_named(ns::EPP, "result")
            .map(EppResult::decode)
            .collect::<Result<Vec<_>>>()?;
        if self.results.is_empty() {
            return Err(EppError::malformed("response carries no result"));
        }

        self.message_queue = match response.child(ns::EPP, "msgQ") {
            Some(queue) => Some(MessageQueue::decode(queue)?),
            None => None,
        };

        match (response.child(ns::EPP, "resData"), &mut self.payload) {
            (Some(data), Some(payload)) => {
                let mapping = data
                    .first_child()
                    .ok_or_else(|| EppError::malformed("resData carries no mapping element"))?;
                payload.decode_payload(mapping, ctx)?;
            }
            (Some(_), None) => {
                return Err(EppError::malformed(
                    "response carries data but no payload was instantiated",
                ));
            }
            (None, existing) => *existing = None,
        }

        self.extensions.clear();
        if let Some(block) = response.child(ns::EPP, "extension") {
            for child in block.children() {
                let mut extension = ctx.registry().create_extension(child)?;
                extension.decode(child, ctx)?;
                if ctx.config().duplicate_extensions == DuplicatePolicy::Reject
                    && self
                        .extensions
                        .iter()
                        .any(|existing| existing.namespace() == extension.namespace())
                {
                    return Err(EppError::duplicate_extension(extension.namespace()));
                }
                self.extensions.push(extension);
            }
        }

        let trid = response.require_child(ns::EPP, "trID")?;
        self.transaction_id = TransactionId {
            client: trid.child_text_owned(ns::EPP, "clTRID"),
            server: trid.require_child_text(ns::EPP, "svTRID")?.to_owned(),
        };
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(Response::duplicate(self))
    }
}

impl Message for Response {
    fn namespace(&self) -> &str {
        self.payload
            .as_deref()
            .map(ResponsePayload::namespace)
            .unwrap_or(ns::EPP)
    }
}

/// 解码入口：从 `<epp>` 根元素恢复一条完整响应。
///
/// # 行为逻辑（How）
/// - 若存在 `<resData>`，以其首个映射元素向注册中心索要载荷就位的空壳；
/// - 否则构造无载荷空壳；随后执行完整的模板解码。
pub fn decode_response(root: &Element, ctx: &DecodeContext<'_>) -> Result<Response> {
    let response = root.require_child(ns::EPP, "response")?;
    let mut decoded = match response
        .child(ns::EPP, "resData")
        .and_then(Element::first_child)
    {
        Some(mapping) => ctx.registry().create_response(mapping)?,
        None => Response {
            results: Vec::new(),
            message_queue: None,
            payload: None,
            extensions: Vec::new(),
            transaction_id: TransactionId::default(),
        },
    };
    decoded.decode(root, ctx)?;
    Ok(decoded)
}

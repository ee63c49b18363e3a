//! 转移操作属性模型。
//!
//! # 设计目标（Why）
//! - 转移命令不是命令内部的多步状态机：客户端仅携带五种子操作之一，
//!   真正的流转状态（待定/批准/驳回/取消等）由服务端在响应里给出；
//! - 把两组取值建模为独立枚举并绑定线上字面量，编码侧“恰有一个操作值”
//!   的保证与解码侧的取值校验都收敛到这里。

use alloc::format;
use core::fmt;

use crate::error::{EppError, Result};

/// 转移命令的子操作，对应命令信封 `<transfer>` 元素的 `op` 属性。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOp {
    /// 当前持有方批准转移。
    Approve,
    /// 发起方撤销尚未完成的转移请求。
    Cancel,
    /// 查询转移进度。
    Query,
    /// 当前持有方驳回转移。
    Reject,
    /// 发起转移请求。
    Request,
}

impl TransferOp {
    /// 协议定义的全部子操作，便于测试与能力枚举。
    pub const ALL: [TransferOp; 5] = [
        TransferOp::Approve,
        TransferOp::Cancel,
        TransferOp::Query,
        TransferOp::Reject,
        TransferOp::Request,
    ];

    /// 线上属性字面量。
    pub fn as_str(self) -> &'static str {
        match self {
            TransferOp::Approve => "approve",
            TransferOp::Cancel => "cancel",
            TransferOp::Query => "query",
            TransferOp::Reject => "reject",
            TransferOp::Request => "request",
        }
    }

    /// 从线上字面量解析；未知取值返回 `epp.decode.out_of_range`。
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "approve" => Ok(TransferOp::Approve),
            "cancel" => Ok(TransferOp::Cancel),
            "query" => Ok(TransferOp::Query),
            "reject" => Ok(TransferOp::Reject),
            "request" => Ok(TransferOp::Request),
            other => Err(EppError::new(
                crate::error::codes::DECODE_OUT_OF_RANGE,
                format!("`{other}` is not a transfer operation"),
            )),
        }
    }
}

impl fmt::Display for TransferOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 转移流程在服务端的文本化状态，出现在映射的转移响应数据里。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    /// 当前持有方已批准。
    ClientApproved,
    /// 发起方已撤销。
    ClientCancelled,
    /// 当前持有方已驳回。
    ClientRejected,
    /// 等待当前持有方处置。
    Pending,
    /// 服务端超时自动批准。
    ServerApproved,
    /// 服务端超时自动取消。
    ServerCancelled,
}

impl TransferStatus {
    /// 线上文本字面量。
    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::ClientApproved => "clientApproved",
            TransferStatus::ClientCancelled => "clientCancelled",
            TransferStatus::ClientRejected => "clientRejected",
            TransferStatus::Pending => "pending",
            TransferStatus::ServerApproved => "serverApproved",
            TransferStatus::ServerCancelled => "serverCancelled",
        }
    }

    /// 从线上文本解析；未知取值返回 `epp.decode.out_of_range`。
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "clientApproved" => Ok(TransferStatus::ClientApproved),
            "clientCancelled" => Ok(TransferStatus::ClientCancelled),
            "clientRejected" => Ok(TransferStatus::ClientRejected),
            "pending" => Ok(TransferStatus::Pending),
            "serverApproved" => Ok(TransferStatus::ServerApproved),
            "serverCancelled" => Ok(TransferStatus::ServerCancelled),
            other => Err(EppError::new(
                crate::error::codes::DECODE_OUT_OF_RANGE,
                format!("`{other}` is not a transfer status"),
            )),
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_ops_round_trip_their_literals() {
        // Why: 五种子操作的字面量是线上契约，解析与输出必须互逆。
        for op in TransferOp::ALL {
            assert_eq!(TransferOp::parse(op.as_str()).expect("parse back"), op);
        }
    }

    #[test]
    fn unknown_literals_are_rejected() {
        let err = TransferOp::parse("steal").unwrap_err();
        assert_eq!(err.code(), crate::error::codes::DECODE_OUT_OF_RANGE);
        let err = TransferStatus::parse("pending-ish").unwrap_err();
        assert_eq!(err.code(), crate::error::codes::DECODE_OUT_OF_RANGE);
    }
}

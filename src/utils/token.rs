// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sha2::{Digest, Sha256};

/// 有效API令牌集合
///
/// 令牌以SHA-256摘要形式保存，比较时对每个摘要做定长比较，
/// 不因匹配位置提前返回，避免计时侧信道泄露令牌内容。
/// 集合允许同时持有多个令牌，以支持轮换窗口期的新旧令牌并存。
pub struct ApiTokenSet {
    digests: Vec<[u8; 32]>,
}

impl ApiTokenSet {
    /// 从明文令牌列表构建集合
    pub fn new(tokens: &[String]) -> Self {
        let digests = tokens
            .iter()
            .map(|token| Sha256::digest(token.as_bytes()).into())
            .collect();
        Self { digests }
    }

    /// 校验给定令牌是否在有效集合中
    pub fn contains(&self, presented: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        let mut matched = false;
        for known in &self.digests {
            matched |= digests_equal(known, &digest);
        }
        matched
    }

    /// 集合是否为空（空集合拒绝一切请求）
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

// Constant-time comparison over the full 32 bytes.
fn digests_equal(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

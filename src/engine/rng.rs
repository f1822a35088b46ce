// ==========================================
// 模型铁路调车场交换系统 - 可注入随机源
// ==========================================
// 职责: 补车数量抽取与候选车辆抽样共用的唯一随机源
// 约束: 相同种子 → 相同交换结果（测试可复现）
// ==========================================

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 交换随机源（ChaCha8，跨平台确定性）
pub struct ExchangeRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl ExchangeRng {
    /// 以给定种子创建
    pub fn from_seed_u64(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// 从系统熵抽取种子；种子会被记录到报告中，便于复现
    pub fn from_entropy() -> Self {
        let seed: u64 = rand::thread_rng().gen();
        Self::from_seed_u64(seed)
    }

    /// 本随机源使用的种子
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngCore for ExchangeRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

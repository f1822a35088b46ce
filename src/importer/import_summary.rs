// ==========================================
// 模型铁路调车场交换系统 - 导入结果汇总
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub inserted: usize,
    /// 车位缺省或无法识别，改放场外暂存区的车辆数（仅车辆导入）
    pub redirected_to_off_layout: usize,
    /// 导入过程中新建的车型
    pub car_types_created: Vec<String>,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "读取 {} 行，写入 {} 条", self.rows_read, self.inserted)?;
        if self.redirected_to_off_layout > 0 {
            write!(f, "，{} 辆改放场外暂存区", self.redirected_to_off_layout)?;
        }
        if !self.car_types_created.is_empty() {
            write!(f, "，新建车型: {}", self.car_types_created.join(", "))?;
        }
        Ok(())
    }
}

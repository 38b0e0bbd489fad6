// ==========================================
// 工作中心目标引擎 - 效率计算
// ==========================================
// 效率 = (SMV × 产量 × 100) / (人数 × 工作分钟)
// 人数/分钟非正、SMV/产量缺失时返回 0，从不报错
// ==========================================

/// 计算效率百分比（未取整）
pub fn efficiency(
    output_qty: Option<f64>,
    smv: Option<f64>,
    team_member_count: i64,
    work_minutes: f64,
) -> f64 {
    let (Some(output_qty), Some(smv)) = (output_qty, smv) else {
        return 0.0;
    };
    if team_member_count <= 0 || work_minutes <= 0.0 {
        return 0.0;
    }
    (smv * output_qty * 100.0) / (team_member_count as f64 * work_minutes)
}

/// 保留两位小数（四舍五入）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

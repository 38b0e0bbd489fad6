// ==========================================
// 工作中心目标引擎 - 领域类型定义
// ==========================================
// 班次 / 时段位置 / 达成状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 班次 (Shift)
// ==========================================
// 序列化格式与存储一致: "Morning" / "Evening"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shift {
    Morning, // 早班 05:30-13:30
    Evening, // 晚班 13:30-21:30
}

impl Shift {
    /// 全部班次（按输出顺序）
    pub const ALL: [Shift; 2] = [Shift::Morning, Shift::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Morning => "Morning",
            Shift::Evening => "Evening",
        }
    }

    /// 宽松解析：未知值返回 None（聚合路径上用于丢弃脏数据）
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Morning" => Some(Shift::Morning),
            "Evening" => Some(Shift::Evening),
            _ => None,
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shift::parse(s.trim()).ok_or_else(|| format!("未知班次: {}", s))
    }
}

// ==========================================
// 时段位置 (Slot Position)
// ==========================================
// 取值 1..=8；0 仅作为 TimeSlotMap 的“未映射”返回值，不会构造成 SlotPosition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlotPosition(u8);

impl SlotPosition {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;

    pub fn new(value: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// 最后一个时段（"Other" 数据归入此处）
    pub fn last() -> Self {
        Self(Self::MAX)
    }

    pub fn all() -> impl Iterator<Item = SlotPosition> {
        (Self::MIN..=Self::MAX).map(SlotPosition)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// 0 起始的数组下标
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for SlotPosition {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SlotPosition::new(value).ok_or_else(|| format!("时段位置越界: {}", value))
    }
}

impl From<SlotPosition> for u8 {
    fn from(value: SlotPosition) -> Self {
        value.0
    }
}

impl fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 达成状态 (Slot Status)
// ==========================================
// grey: 无目标 / green: 达成 / yellow: 达成 80% 以上 / red: 低于 80%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[default]
    Grey,
    Green,
    Yellow,
    Red,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Grey => "grey",
            SlotStatus::Green => "green",
            SlotStatus::Yellow => "yellow",
            SlotStatus::Red => "red",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

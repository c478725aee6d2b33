/// Parsed form of a schedule item's `time_info` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInfo {
    Slot(NamedSlot),
    Range { start: u32, end: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedSlot {
    FullDay,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl NamedSlot {
    /// Fixed minute-of-day anchor used when ordering against explicit ranges.
    pub fn anchor(&self) -> u32 {
        match self {
            NamedSlot::FullDay => 0,
            NamedSlot::Morning => 360,
            NamedSlot::Afternoon => 780,
            NamedSlot::Evening => 1080,
            NamedSlot::Night => 1320,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full day" => Some(NamedSlot::FullDay),
            "morning" => Some(NamedSlot::Morning),
            "afternoon" => Some(NamedSlot::Afternoon),
            "evening" => Some(NamedSlot::Evening),
            "night" => Some(NamedSlot::Night),
            _ => None,
        }
    }
}

impl TimeInfo {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if let Some(slot) = NamedSlot::parse(s) {
            return Ok(TimeInfo::Slot(slot));
        }

        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("expected a named slot or HH:mm - HH:mm: {s}"))?;
        let start = parse_time(start.trim())?;
        let end = parse_time(end.trim())?;
        if end <= start {
            return Err(anyhow::anyhow!("end time must be after start time: {s}"));
        }
        Ok(TimeInfo::Range { start, end })
    }

    pub fn minute_of_day(&self) -> u32 {
        match self {
            TimeInfo::Slot(slot) => slot.anchor(),
            TimeInfo::Range { start, .. } => *start,
        }
    }
}

fn parse_time(s: &str) -> anyhow::Result<u32> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    if hour.len() != 2 || minute.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = hour
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(hour * 60 + minute)
}

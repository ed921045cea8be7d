//! GTID (Global Transaction ID) 집합 관리
//!
//! GTID 형식: UUID:sequence-number
//! 서버가 출력하는 실행 GTID 집합: "uuid1:1-46:49-50,uuid2:1-7"
//!
//! 내부적으로 구간은 반열린 구간 `[start, stop)` 으로 저장합니다.
//! 텍스트 "N" 은 `[N, N+1)`, "N-M" 은 `[N, M+1)` 이 됩니다.

use crate::error::{ReplicationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 한 source UUID 의 연속된 트랜잭션 번호 구간 (`stop` 미포함)
///
/// 항상 `start < stop`. 생성은 [`Interval::new`] 를 거치며 역직렬화도 같은 검사를 받습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: i64,
    stop: i64,
}

#[derive(Deserialize)]
struct RawInterval {
    start: i64,
    stop: i64,
}

impl TryFrom<RawInterval> for Interval {
    type Error = ReplicationError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start, raw.stop)
    }
}

impl Interval {
    pub fn new(start: i64, stop: i64) -> Result<Self> {
        if start >= stop {
            return Err(ReplicationError::parse(format!(
                "Invalid interval: start {} >= stop {}",
                start, stop
            )));
        }
        Ok(Interval { start, stop })
    }

    /// 트랜잭션 하나짜리 구간
    pub fn single(txn: i64) -> Result<Self> {
        let stop = txn
            .checked_add(1)
            .ok_or_else(|| ReplicationError::parse(format!("Transaction number overflow: {}", txn)))?;
        Interval::new(txn, stop)
    }

    /// "N" 또는 "N-M" 형식의 구간 파싱
    pub fn parse(segment: &str) -> Result<Self> {
        if segment.is_empty() {
            return Err(ReplicationError::parse("Empty interval segment"));
        }

        match segment.split_once('-') {
            None => Interval::single(parse_txn_number(segment, segment)?),
            Some((start, end)) => {
                let start = parse_txn_number(start, segment)?;
                let end = parse_txn_number(end, segment)?;
                if start > end {
                    return Err(ReplicationError::parse(format!(
                        "Invalid range: start > end in '{}'",
                        segment
                    )));
                }
                let stop = end.checked_add(1).ok_or_else(|| {
                    ReplicationError::parse(format!("Transaction number overflow in '{}'", segment))
                })?;
                Interval::new(start, stop)
            }
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn contains(&self, txn: i64) -> bool {
        self.start <= txn && txn < self.stop
    }

    /// 마지막으로 포함된 트랜잭션 번호
    pub fn last(&self) -> i64 {
        self.stop - 1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stop - self.start == 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.last())
        }
    }
}

/// 음이 아닌 10진수만 허용 ('+' 부호, 공백 거부)
fn parse_txn_number(text: &str, segment: &str) -> Result<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReplicationError::parse(format!(
            "Invalid transaction number in '{}'",
            segment
        )));
    }
    text.parse::<i64>().map_err(|_| {
        ReplicationError::parse(format!("Transaction number out of range in '{}'", segment))
    })
}

/// UUID 하나의 구간 집합
///
/// 항상 start 기준 오름차순이며, 겹치거나 맞닿은 구간은 하나로 병합되어 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Interval>", into = "Vec<Interval>")]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        IntervalSet::default()
    }

    /// 구간 삽입. 겹치거나 맞닿은 (stop == start) 구간과 병합
    pub fn insert(&mut self, interval: Interval) {
        debug_assert!(interval.start < interval.stop);
        let lo = self.intervals.partition_point(|i| i.stop < interval.start);
        let hi = self.intervals.partition_point(|i| i.start <= interval.stop);

        let mut merged = interval;
        if lo < hi {
            merged.start = merged.start.min(self.intervals[lo].start);
            merged.stop = merged.stop.max(self.intervals[hi - 1].stop);
        }
        self.intervals.splice(lo..hi, std::iter::once(merged));
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// 가장 높은 구간
    pub fn last(&self) -> Option<&Interval> {
        self.intervals.last()
    }

    pub fn contains_txn(&self, txn: i64) -> bool {
        let idx = self.intervals.partition_point(|i| i.stop <= txn);
        self.intervals.get(idx).map_or(false, |i| i.contains(txn))
    }

    /// `other` 의 모든 트랜잭션이 이 집합에 포함되는지
    pub fn contains(&self, other: &IntervalSet) -> bool {
        other.intervals.iter().all(|them| {
            let idx = self.intervals.partition_point(|me| me.stop <= them.start);
            self.intervals
                .get(idx)
                .map_or(false, |me| me.start <= them.start && them.stop <= me.stop)
        })
    }

    pub fn merge(&mut self, other: &IntervalSet) {
        for interval in &other.intervals {
            self.insert(*interval);
        }
    }
}

impl Extend<Interval> for IntervalSet {
    fn extend<T: IntoIterator<Item = Interval>>(&mut self, iter: T) {
        for interval in iter {
            self.insert(interval);
        }
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        let mut set = IntervalSet::new();
        set.extend(iter);
        set
    }
}

impl From<Vec<Interval>> for IntervalSet {
    fn from(intervals: Vec<Interval>) -> Self {
        intervals.into_iter().collect()
    }
}

impl From<IntervalSet> for Vec<Interval> {
    fn from(set: IntervalSet) -> Self {
        set.intervals
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}", interval)?;
        }
        Ok(())
    }
}

/// 전체 GTID 집합 (source UUID -> 구간 집합)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GtidSet {
    sets: BTreeMap<String, IntervalSet>,
}

impl GtidSet {
    pub fn new() -> Self {
        GtidSet::default()
    }

    /// GTID 집합 문자열 파싱 (format: "uuid1:1-100:200,uuid2:1-50")
    ///
    /// 빈 문자열은 빈 집합입니다. 잘못된 구간이 하나라도 있으면 전체가 실패합니다.
    pub fn parse(gtid_str: &str) -> Result<Self> {
        let mut gtid_set = GtidSet::new();

        let gtid_str = gtid_str.trim();
        if gtid_str.is_empty() {
            return Ok(gtid_set);
        }

        // 서버 출력은 "uuid1:1-5,\nuuid2:1-3" 처럼 줄바꿈이 섞여 있음
        for uuid_set in gtid_str.split(',') {
            let (uuid, intervals) = parse_uuid_set(uuid_set.trim())?;
            gtid_set.sets.entry(uuid.to_string()).or_default().extend(intervals);
        }

        Ok(gtid_set)
    }

    /// 구간 하나 추가
    pub fn add(&mut self, uuid: impl Into<String>, interval: Interval) {
        self.sets.entry(uuid.into()).or_default().insert(interval);
    }

    pub fn get(&self, uuid: &str) -> Option<&IntervalSet> {
        self.sets.get(uuid)
    }

    /// 구간이 하나 이상 있는 source 만 순회
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IntervalSet)> + '_ {
        self.sets
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(uuid, set)| (uuid.as_str(), set))
    }

    /// 구간이 하나 이상 있는 source 수
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(IntervalSet::is_empty)
    }

    /// `other` 가 이 집합의 부분집합인지
    pub fn contains(&self, other: &GtidSet) -> bool {
        other.sets.iter().all(|(uuid, theirs)| {
            theirs.is_empty() || self.sets.get(uuid).map_or(false, |mine| mine.contains(theirs))
        })
    }

    pub fn merge(&mut self, other: &GtidSet) {
        for (uuid, set) in &other.sets {
            self.sets.entry(uuid.clone()).or_default().merge(set);
        }
    }

    /// 해당 source 의 다음 미사용 트랜잭션 번호 (가장 높은 구간의 stop)
    pub fn next_txn_id(&self, uuid: &str) -> Result<i64> {
        let set = self
            .sets
            .get(uuid)
            .ok_or_else(|| ReplicationError::UnknownSource(uuid.to_string()))?;
        set.last()
            .map(|interval| interval.stop)
            .ok_or_else(|| ReplicationError::EmptySource(uuid.to_string()))
    }
}

/// "uuid:range(:range)*" 파싱. UUID 형식 자체는 검증하지 않음
fn parse_uuid_set(text: &str) -> Result<(&str, Vec<Interval>)> {
    let mut parts = text.split(':');
    let uuid = parts.next().unwrap_or_default();
    if uuid.is_empty() {
        return Err(ReplicationError::parse(format!("Empty source UUID in '{}'", text)));
    }

    let intervals = parts.map(Interval::parse).collect::<Result<Vec<_>>>()?;
    if intervals.is_empty() {
        return Err(ReplicationError::parse(format!(
            "Invalid GTID format, expected UUID:interval[:interval]: '{}'",
            text
        )));
    }

    Ok((uuid, intervals))
}

impl FromStr for GtidSet {
    type Err = ReplicationError;

    fn from_str(s: &str) -> Result<Self> {
        GtidSet::parse(s)
    }
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (uuid, set) in &self.sets {
            if set.is_empty() {
                continue;
            }
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", uuid, set)?;
            first = false;
        }
        Ok(())
    }
}

/// GTID 집합 문자열에서 해당 source 의 다음 트랜잭션 번호 계산
pub fn next_txn_id(gtid_str: &str, uuid: &str) -> Result<i64> {
    GtidSet::parse(gtid_str)?.next_txn_id(uuid)
}

//! The immutable problem instance: courses, rooms, curricula, availability
//! and the derived conflict graph. Parses the ITC-2007 header+sections
//! input format described in the accompanying design notes.

use std::collections::HashMap;
use std::io::BufRead;

use anyhow::{anyhow, bail, Context, Result};
use bit_set::BitSet;
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CourseId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(u32);

impl CourseId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        CourseId(index as u32)
    }
}

impl RoomId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        RoomId(index as u32)
    }

    /// 1-based room number as stored in a timetable cell.
    pub fn as_room_number(self) -> u32 {
        self.0 + 1
    }

    pub fn from_room_number(number: u32) -> Self {
        RoomId(number - 1)
    }
}

#[derive(Debug)]
pub struct Course {
    pub name: String,
    pub teacher: String,
    pub students: u32,
    pub lectures: u32,
    pub min_working_days: u32,
}

#[derive(Debug)]
pub struct Room {
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug)]
pub struct Curriculum {
    pub name: String,
    pub courses: Vec<CourseId>,
}

/// The faculty's timetabling instance. Built once from an input stream and
/// logically immutable afterwards: every shot borrows it, none mutate it.
#[derive(Debug)]
pub struct Faculty {
    pub name: String,
    pub days: usize,
    pub periods_per_day: usize,

    pub courses: Vec<Course>,
    pub rooms: Vec<Room>,
    pub curricula: Vec<Curriculum>,

    course_by_name: HashMap<String, CourseId>,
    room_by_name: HashMap<String, RoomId>,

    /// `avail[c]` is the set of periods course `c` is NOT available at;
    /// absence from the set means available (the default).
    unavailable: Vec<BitSet>,

    /// `conflict[c]` is the set of course indices conflicting with `c`.
    conflict: Vec<BitSet>,
}

impl Faculty {
    pub fn total_periods(&self) -> usize {
        self.days * self.periods_per_day
    }

    pub fn num_courses(&self) -> usize {
        self.courses.len()
    }

    pub fn num_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn num_curricula(&self) -> usize {
        self.curricula.len()
    }

    pub fn course_id(&self, name: &str) -> Option<CourseId> {
        self.course_by_name.get(name).copied()
    }

    pub fn room_id(&self, name: &str) -> Option<RoomId> {
        self.room_by_name.get(name).copied()
    }

    pub fn course(&self, id: CourseId) -> &Course {
        &self.courses[id.index()]
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.index()]
    }

    pub fn period_to_day_timeslot(&self, period: usize) -> (usize, usize) {
        (period / self.periods_per_day, period % self.periods_per_day)
    }

    pub fn day_timeslot_to_period(&self, day: usize, timeslot: usize) -> usize {
        day * self.periods_per_day + timeslot
    }

    pub fn is_available(&self, course: CourseId, period: usize) -> bool {
        !self.unavailable[course.index()].contains(period)
    }

    pub fn conflict(&self, course: CourseId) -> &BitSet {
        &self.conflict[course.index()]
    }

    pub fn conflicting(&self, a: CourseId, b: CourseId) -> bool {
        a != b && self.conflict[a.index()].contains(b.index())
    }

    /// Sum of required lectures across every course; used as the solver's
    /// default `violation_cost`.
    pub fn total_required_lectures(&self) -> u64 {
        self.courses.iter().map(|c| c.lectures as u64).sum()
    }

    pub fn from_str(input: &str) -> Result<Faculty> {
        Faculty::from_reader(input.as_bytes())
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Faculty> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(idx, line)| -> Result<(usize, String)> {
                Ok((idx + 1, line.context("failed to read line from faculty input")?))
            });

        let mut header: HashMap<String, String> = HashMap::new();
        let header_keys = [
            "Name",
            "Courses",
            "Rooms",
            "Days",
            "Periods_per_day",
            "Curricula",
            "Constraints",
        ];

        for key in header_keys {
            let (line_no, line) = next_nonblank(&mut lines)?
                .ok_or_else(|| anyhow!("input ended while reading header field {key:?}"))?;
            let (found_key, value) = line
                .split_once(':')
                .ok_or_else(|| anyhow!("line {line_no}: expected \"{key}: value\", got {line:?}"))?;
            if found_key.trim() != key {
                bail!("line {line_no}: expected header field {key:?}, found {found_key:?}");
            }
            header.insert(key.to_string(), value.trim().to_string());
        }

        let name = header.remove("Name").unwrap();
        let num_courses: usize = parse_header_count(&header, "Courses")?;
        let num_rooms: usize = parse_header_count(&header, "Rooms")?;
        let days: usize = parse_header_count(&header, "Days")?;
        let periods_per_day: usize = parse_header_count(&header, "Periods_per_day")?;
        let num_curricula: usize = parse_header_count(&header, "Curricula")?;
        let num_constraints: usize = parse_header_count(&header, "Constraints")?;

        expect_section_header(&mut lines, "COURSES:")?;
        let mut courses = Vec::with_capacity(num_courses);
        let mut course_by_name = HashMap::with_capacity(num_courses);
        for _ in 0..num_courses {
            let (line_no, line) = next_nonblank(&mut lines)?
                .ok_or_else(|| anyhow!("input ended while reading COURSES section"))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [cname, teacher, lectures, min_working_days, students] = fields.as_slice() else {
                bail!("line {line_no}: expected 5 fields in COURSES section, got {line:?}");
            };
            let course_id = CourseId(courses.len() as u32);
            if course_by_name
                .insert(cname.to_string(), course_id)
                .is_some()
            {
                bail!("line {line_no}: duplicate course name {cname:?}");
            }
            courses.push(Course {
                name: cname.to_string(),
                teacher: teacher.to_string(),
                lectures: lectures
                    .parse()
                    .with_context(|| format!("line {line_no}: bad lectures count"))?,
                min_working_days: min_working_days
                    .parse()
                    .with_context(|| format!("line {line_no}: bad min working days"))?,
                students: students
                    .parse()
                    .with_context(|| format!("line {line_no}: bad student count"))?,
            });
        }

        expect_section_header(&mut lines, "ROOMS:")?;
        let mut rooms = Vec::with_capacity(num_rooms);
        let mut room_by_name = HashMap::with_capacity(num_rooms);
        for _ in 0..num_rooms {
            let (line_no, line) = next_nonblank(&mut lines)?
                .ok_or_else(|| anyhow!("input ended while reading ROOMS section"))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [rname, capacity] = fields.as_slice() else {
                bail!("line {line_no}: expected 2 fields in ROOMS section, got {line:?}");
            };
            let room_id = RoomId(rooms.len() as u32);
            if room_by_name.insert(rname.to_string(), room_id).is_some() {
                bail!("line {line_no}: duplicate room name {rname:?}");
            }
            rooms.push(Room {
                name: rname.to_string(),
                capacity: capacity
                    .parse()
                    .with_context(|| format!("line {line_no}: bad room capacity"))?,
            });
        }

        expect_section_header(&mut lines, "CURRICULA:")?;
        let mut curricula = Vec::with_capacity(num_curricula);
        for _ in 0..num_curricula {
            let (line_no, line) = next_nonblank(&mut lines)?
                .ok_or_else(|| anyhow!("input ended while reading CURRICULA section"))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [gname, member_count, members @ ..] = fields.as_slice() else {
                bail!("line {line_no}: empty CURRICULA line {line:?}");
            };
            let member_count: usize = member_count
                .parse()
                .with_context(|| format!("line {line_no}: bad member count"))?;
            if members.len() != member_count {
                bail!(
                    "line {line_no}: curriculum {gname} declares {member_count} members but lists {}",
                    members.len()
                );
            }
            let course_ids = members
                .iter()
                .map(|member_name| {
                    course_by_name.get(*member_name).copied().ok_or_else(|| {
                        anyhow!("line {line_no}: curriculum {gname} references unknown course {member_name:?}")
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            curricula.push(Curriculum {
                name: gname.to_string(),
                courses: course_ids,
            });
        }

        expect_section_header(&mut lines, "UNAVAILABILITY_CONSTRAINTS:")?;
        let total_periods = days * periods_per_day;
        let mut unavailable: Vec<BitSet> = (0..courses.len())
            .map(|_| BitSet::with_capacity(total_periods))
            .collect();
        for _ in 0..num_constraints {
            let (line_no, line) = next_nonblank(&mut lines)?
                .ok_or_else(|| anyhow!("input ended while reading UNAVAILABILITY_CONSTRAINTS section"))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [cname, day, timeslot] = fields.as_slice() else {
                bail!("line {line_no}: expected 3 fields in UNAVAILABILITY_CONSTRAINTS section, got {line:?}");
            };
            let course_id = course_by_name
                .get(*cname)
                .copied()
                .ok_or_else(|| anyhow!("line {line_no}: unknown course {cname:?} in unavailability constraint"))?;
            let day: usize = day
                .parse()
                .with_context(|| format!("line {line_no}: bad day"))?;
            let timeslot: usize = timeslot
                .parse()
                .with_context(|| format!("line {line_no}: bad timeslot"))?;
            if day >= days || timeslot >= periods_per_day {
                bail!("line {line_no}: out of range day/timeslot {day}/{timeslot}");
            }
            unavailable[course_id.index()].insert(day * periods_per_day + timeslot);
        }

        if let Some((line_no, line)) = next_nonblank(&mut lines)? {
            if line.trim() != "END." {
                bail!("line {line_no}: expected END., found {line:?}");
            }
        }

        let conflict = derive_conflicts(&courses, &curricula);

        Ok(Faculty {
            name,
            days,
            periods_per_day,
            courses,
            rooms,
            curricula,
            course_by_name,
            room_by_name,
            unavailable,
            conflict,
        })
    }
}

fn derive_conflicts(courses: &[Course], curricula: &[Curriculum]) -> Vec<BitSet> {
    let mut conflict: Vec<BitSet> = (0..courses.len())
        .map(|_| BitSet::with_capacity(courses.len()))
        .collect();

    let mut mark = |a: usize, b: usize| {
        if a != b {
            conflict[a].insert(b);
            conflict[b].insert(a);
        }
    };

    for curriculum in curricula {
        for (a, b) in curriculum.courses.iter().copied().tuple_combinations() {
            mark(a.index(), b.index());
        }
    }

    for (i, j) in (0..courses.len()).tuple_combinations() {
        if courses[i].teacher == courses[j].teacher {
            mark(i, j);
        }
    }

    conflict
}

fn parse_header_count(header: &HashMap<String, String>, key: &str) -> Result<usize> {
    header[key]
        .parse()
        .with_context(|| format!("bad header value for {key}: {:?}", header[key]))
}

type LineIter<'a> = dyn Iterator<Item = Result<(usize, String)>> + 'a;

fn next_nonblank(lines: &mut LineIter<'_>) -> Result<Option<(usize, String)>> {
    for item in lines {
        let (line_no, line) = item?;
        if !line.trim().is_empty() {
            return Ok(Some((line_no, line)));
        }
    }
    Ok(None)
}

fn expect_section_header(lines: &mut LineIter<'_>, expected: &str) -> Result<()> {
    let (line_no, line) = next_nonblank(lines)?
        .ok_or_else(|| anyhow!("input ended before section header {expected:?}"))?;
    if line.trim() != expected {
        bail!("line {line_no}: expected section header {expected:?}, found {line:?}");
    }
    Ok(())
}

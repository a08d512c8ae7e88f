//! The candidate solution: a courses × periods grid of room assignments,
//! plus the redundant caches the evaluator and mutation operators read
//! from. See `refresh` for the single source of truth on cache contents.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::diagnostics::Diagnostics;
use crate::faculty::{CourseId, Faculty, RoomId};

/// A candidate solution over some `Faculty`. Holds a non-owning reference
/// to its faculty: two timetables are equal only if they share that
/// faculty's identity *and* agree cell-by-cell.
#[derive(Debug)]
pub struct Timetable<'f> {
    faculty: &'f Faculty,

    /// `tt[c][p]`: 0 = unassigned, else a 1-based room number.
    tt: Vec<Vec<u32>>,

    /// `room_lectures[r][p]`, r in 0..=R (index 0 unused, kept for the
    /// invariant that it is always 0).
    room_lectures: Vec<Vec<u32>>,
    /// `curriculum_period_lectures[g][p]`.
    curriculum_period_lectures: Vec<Vec<u32>>,
    /// `course_daily_lectures[c][d]`.
    course_daily_lectures: Vec<Vec<u32>>,
    /// `working_days[c]`.
    working_days: Vec<u32>,
    /// `used_rooms[c]`, first-seen order, no duplicates.
    used_rooms: Vec<Vec<u32>>,
}

impl<'f> Timetable<'f> {
    pub fn faculty(&self) -> &'f Faculty {
        self.faculty
    }

    pub fn room_at(&self, course: CourseId, period: usize) -> u32 {
        self.tt[course.index()][period]
    }

    pub fn set_room_at(&mut self, course: CourseId, period: usize, room_number: u32) {
        self.tt[course.index()][period] = room_number;
    }

    pub fn clear_at(&mut self, course: CourseId, period: usize) {
        self.tt[course.index()][period] = 0;
    }

    pub fn room_lectures(&self, room: RoomId, period: usize) -> u32 {
        self.room_lectures[room.as_room_number() as usize][period]
    }

    /// Raw accessor over the full `0..=R` range (index 0 is the "no room"
    /// sentinel, always 0 by invariant; §4.3 term 4 inspects it anyway).
    pub fn room_lectures_by_number(&self, room_number: u32, period: usize) -> u32 {
        self.room_lectures[room_number as usize][period]
    }

    pub fn num_room_slots(&self) -> usize {
        self.room_lectures.len()
    }

    pub fn curriculum_period_lectures(&self, curriculum: usize, period: usize) -> u32 {
        self.curriculum_period_lectures[curriculum][period]
    }

    pub fn working_days(&self, course: CourseId) -> u32 {
        self.working_days[course.index()]
    }

    pub fn used_rooms(&self, course: CourseId) -> &[u32] {
        &self.used_rooms[course.index()]
    }

    pub fn course_daily_lectures(&self, course: CourseId, day: usize) -> u32 {
        self.course_daily_lectures[course.index()][day]
    }

    fn empty_caches(faculty: &Faculty) -> (
        Vec<Vec<u32>>,
        Vec<Vec<u32>>,
        Vec<Vec<u32>>,
        Vec<u32>,
        Vec<Vec<u32>>,
    ) {
        let t = faculty.total_periods();
        (
            vec![vec![0; t]; faculty.num_rooms() + 1],
            vec![vec![0; t]; faculty.num_curricula()],
            vec![vec![0; faculty.days]; faculty.num_courses()],
            vec![0; faculty.num_courses()],
            vec![Vec::new(); faculty.num_courses()],
        )
    }

    /// An empty grid (all cells unassigned) with freshly zeroed caches —
    /// already consistent with `refresh`'s contract, no call needed.
    pub fn from_faculty(faculty: &'f Faculty) -> Self {
        let t = faculty.total_periods();
        let tt = vec![vec![0; t]; faculty.num_courses()];
        let (room_lectures, curriculum_period_lectures, course_daily_lectures, working_days, used_rooms) =
            Self::empty_caches(faculty);
        Timetable {
            faculty,
            tt,
            room_lectures,
            curriculum_period_lectures,
            course_daily_lectures,
            working_days,
            used_rooms,
        }
    }

    /// Identical grid, caches zeroed. Caller must `refresh()` before any
    /// cost query — mirrors how mutation operators work on a clone.
    pub fn clone_unrefreshed(&self) -> Self {
        let (room_lectures, curriculum_period_lectures, course_daily_lectures, working_days, used_rooms) =
            Self::empty_caches(self.faculty);
        Timetable {
            faculty: self.faculty,
            tt: self.tt.clone(),
            room_lectures,
            curriculum_period_lectures,
            course_daily_lectures,
            working_days,
            used_rooms,
        }
    }

    /// Recomputes every cache from the grid in a single pass. Mandatory
    /// after any mutation, before the next evaluation.
    pub fn refresh(&mut self) {
        let (room_lectures, curriculum_period_lectures, course_daily_lectures, working_days, used_rooms) =
            Self::empty_caches(self.faculty);
        self.room_lectures = room_lectures;
        self.curriculum_period_lectures = curriculum_period_lectures;
        self.course_daily_lectures = course_daily_lectures;
        self.working_days = working_days;
        self.used_rooms = used_rooms;

        let periods_per_day = self.faculty.periods_per_day;

        for (c, row) in self.tt.iter().enumerate() {
            for (p, &room_number) in row.iter().enumerate() {
                if room_number == 0 {
                    continue;
                }
                self.room_lectures[room_number as usize][p] += 1;

                let day = p / periods_per_day;
                self.course_daily_lectures[c][day] += 1;

                if !self.used_rooms[c].contains(&room_number) {
                    self.used_rooms[c].push(room_number);
                }
            }
        }

        for c in 0..self.tt.len() {
            self.working_days[c] = self.course_daily_lectures[c]
                .iter()
                .filter(|&&count| count > 0)
                .count() as u32;
        }

        for (g, curriculum) in self.faculty.curricula.iter().enumerate() {
            for &member in &curriculum.courses {
                for p in 0..self.faculty.total_periods() {
                    if self.tt[member.index()][p] != 0 {
                        self.curriculum_period_lectures[g][p] += 1;
                    }
                }
            }
        }
    }

    /// Parses `course_name room_name day timeslot` lines, skipping (with a
    /// diagnostic warning) any that reference unknown names, out-of-range
    /// periods, or an already-occupied cell. Ends with a `refresh()`.
    pub fn from_stream(
        faculty: &'f Faculty,
        reader: impl BufRead,
        diagnostics: &dyn Diagnostics,
    ) -> Result<Self> {
        let mut timetable = Timetable::from_faculty(faculty);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read line {} of solution stream", line_no + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let [course_name, room_name, day, timeslot] = fields.as_slice() else {
                diagnostics.warn(&format!("line {}: expected 4 fields, skipping {line:?}", line_no + 1));
                continue;
            };

            let Some(course_id) = faculty.course_id(course_name) else {
                diagnostics.warn(&format!("line {}: unknown course {course_name:?}, skipping", line_no + 1));
                continue;
            };
            let Some(room_id) = faculty.room_id(room_name) else {
                diagnostics.warn(&format!("line {}: unknown room {room_name:?}, skipping", line_no + 1));
                continue;
            };
            let Ok(day) = day.parse::<usize>() else {
                diagnostics.warn(&format!("line {}: bad day {day:?}, skipping", line_no + 1));
                continue;
            };
            let Ok(timeslot) = timeslot.parse::<usize>() else {
                diagnostics.warn(&format!("line {}: bad timeslot {timeslot:?}, skipping", line_no + 1));
                continue;
            };
            if day >= faculty.days || timeslot >= faculty.periods_per_day {
                diagnostics.warn(&format!(
                    "line {}: day/timeslot {day}/{timeslot} out of range, skipping",
                    line_no + 1
                ));
                continue;
            }

            let period = faculty.day_timeslot_to_period(day, timeslot);
            if timetable.room_at(course_id, period) != 0 {
                diagnostics.warn(&format!(
                    "line {}: {course_name} already has a lecture at period {period}, skipping",
                    line_no + 1
                ));
                continue;
            }

            timetable.set_room_at(course_id, period, room_id.as_room_number());
        }

        timetable.refresh();
        Ok(timetable)
    }

    /// Emits `course_name room_name day timeslot` lines in row-major
    /// (course ascending, then period ascending) order.
    pub fn to_stream(&self, mut writer: impl Write) -> Result<()> {
        for (c, row) in self.tt.iter().enumerate() {
            let course = self.faculty.course(CourseId::from_index(c));
            for (p, &room_number) in row.iter().enumerate() {
                if room_number == 0 {
                    continue;
                }
                let room = self.faculty.room(RoomId::from_room_number(room_number));
                let (day, timeslot) = self.faculty.period_to_day_timeslot(p);
                writeln!(writer, "{} {} {} {}", course.name, room.name, day, timeslot)?;
            }
        }
        Ok(())
    }
}

impl<'f> PartialEq for Timetable<'f> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.faculty, other.faculty) && self.tt == other.tt
    }
}

impl<'f> Eq for Timetable<'f> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faculty::Faculty;

    fn toy_faculty() -> Faculty {
        Faculty::from_str(
            "Name: ToyExample\n\
             Courses: 2\n\
             Rooms: 2\n\
             Days: 2\n\
             Periods_per_day: 2\n\
             Curricula: 1\n\
             Constraints: 0\n\
             \n\
             COURSES:\n\
             A Ocra 2 1 10\n\
             B Indaco 1 1 5\n\
             \n\
             ROOMS:\n\
             rA 32\n\
             rB 50\n\
             \n\
             CURRICULA:\n\
             Cur1 2 A B\n\
             \n\
             UNAVAILABILITY_CONSTRAINTS:\n\
             \n\
             END.\n",
        )
        .unwrap()
    }

    #[test]
    fn refresh_is_idempotent() {
        let faculty = toy_faculty();
        let a = faculty.course_id("A").unwrap();
        let mut tt = Timetable::from_faculty(&faculty);
        tt.set_room_at(a, 0, 1);
        tt.refresh();
        let snapshot_once: Vec<_> = tt.room_lectures.clone();
        tt.refresh();
        assert_eq!(tt.room_lectures, snapshot_once);
    }

    #[test]
    fn clone_then_refresh_matches_original_caches() {
        let faculty = toy_faculty();
        let a = faculty.course_id("A").unwrap();
        let mut tt = Timetable::from_faculty(&faculty);
        tt.set_room_at(a, 0, 1);
        tt.set_room_at(a, 2, 2);
        tt.refresh();

        let mut cloned = tt.clone_unrefreshed();
        cloned.refresh();

        assert_eq!(tt.room_lectures, cloned.room_lectures);
        assert_eq!(tt.working_days, cloned.working_days);
        assert_eq!(tt.used_rooms, cloned.used_rooms);
        assert_eq!(tt, cloned);
    }

    #[test]
    fn working_days_counts_distinct_days_with_a_lecture() {
        let faculty = toy_faculty();
        let a = faculty.course_id("A").unwrap();
        let mut tt = Timetable::from_faculty(&faculty);
        tt.set_room_at(a, 0, 1); // day 0
        tt.set_room_at(a, 1, 1); // day 0 again
        tt.refresh();
        assert_eq!(tt.working_days(a), 1);
    }

    #[test]
    fn used_rooms_has_no_duplicates_and_matches_the_grid() {
        let faculty = toy_faculty();
        let a = faculty.course_id("A").unwrap();
        let mut tt = Timetable::from_faculty(&faculty);
        tt.set_room_at(a, 0, 1);
        tt.set_room_at(a, 2, 1);
        tt.set_room_at(a, 3, 2);
        tt.refresh();
        assert_eq!(tt.used_rooms(a), &[1, 2]);
    }

    #[test]
    fn round_trips_through_to_stream_and_from_stream() {
        let faculty = toy_faculty();
        let a = faculty.course_id("A").unwrap();
        let mut tt = Timetable::from_faculty(&faculty);
        tt.set_room_at(a, 0, 1);
        tt.refresh();

        let mut bytes = Vec::new();
        tt.to_stream(&mut bytes).unwrap();

        let sink = crate::diagnostics::CollectingDiagnostics::new();
        let reloaded = Timetable::from_stream(&faculty, bytes.as_slice(), &sink).unwrap();
        assert_eq!(tt, reloaded);
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn from_stream_skips_bad_lines_and_warns_once_each() {
        let faculty = toy_faculty();
        let sink = crate::diagnostics::CollectingDiagnostics::new();
        let input = "Nope rA 0 0\nA NoRoom 0 0\nA rA 0 0\nA rA 0 0\n";
        let tt = Timetable::from_stream(&faculty, input.as_bytes(), &sink).unwrap();

        let a = faculty.course_id("A").unwrap();
        assert_eq!(tt.room_at(a, 0), 1);
        assert_eq!(sink.messages().len(), 3);
    }
}

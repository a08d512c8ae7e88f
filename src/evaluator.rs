//! Computes the four hard-violation counts and four soft-cost counts for a
//! `Timetable` against its `Faculty`, plus the fixed-format diagnostic
//! report. An `Evaluator` is a snapshot: build a new one after the
//! timetable changes.

use std::io::{self, Write};

use crate::faculty::{CourseId, Faculty};
use crate::timetable::Timetable;

pub const MIN_WORKING_DAYS_COST: u64 = 5;
pub const CURRICULUM_COMPACTNESS_COST: u64 = 2;
pub const ROOM_STABILITY_COST: u64 = 1;

struct Line {
    text: String,
    weight: u64,
}

/// All eight cost terms, computed eagerly at construction (an equivalent,
/// simpler alternative to per-field lazy memoisation — see design notes).
pub struct Evaluator<'f, 't> {
    faculty: &'f Faculty,
    timetable: &'t Timetable<'f>,

    lectures: u64,
    conflicts: u64,
    availability: u64,
    room_occupation: u64,
    room_capacity: u64,
    min_working_days: u64,
    curriculum_compactness: u64,
    room_stability: u64,

    lectures_lines: Vec<Line>,
    conflicts_lines: Vec<Line>,
    availability_lines: Vec<Line>,
    room_occupation_lines: Vec<Line>,
    room_capacity_lines: Vec<Line>,
    min_working_days_lines: Vec<Line>,
    curriculum_compactness_lines: Vec<Line>,
    room_stability_lines: Vec<Line>,
}

fn period_suffix(faculty: &Faculty, period: usize) -> String {
    let (day, timeslot) = faculty.period_to_day_timeslot(period);
    format!("period {period} (day {day}, timeslot {timeslot})")
}

impl<'f, 't> Evaluator<'f, 't> {
    pub fn new(faculty: &'f Faculty, timetable: &'t Timetable<'f>) -> Self {
        let (lectures, lectures_lines) = Self::eval_lectures(faculty, timetable);
        let (conflicts, conflicts_lines) = Self::eval_conflicts(faculty, timetable);
        let (availability, availability_lines) = Self::eval_availability(faculty, timetable);
        let (room_occupation, room_occupation_lines) = Self::eval_room_occupation(faculty, timetable);
        let (room_capacity, room_capacity_lines) = Self::eval_room_capacity(faculty, timetable);
        let (min_working_days, min_working_days_lines) = Self::eval_min_working_days(faculty, timetable);
        let (curriculum_compactness, curriculum_compactness_lines) =
            Self::eval_curriculum_compactness(faculty, timetable);
        let (room_stability, room_stability_lines) = Self::eval_room_stability(faculty, timetable);

        Evaluator {
            faculty,
            timetable,
            lectures,
            conflicts,
            availability,
            room_occupation,
            room_capacity,
            min_working_days,
            curriculum_compactness,
            room_stability,
            lectures_lines,
            conflicts_lines,
            availability_lines,
            room_occupation_lines,
            room_capacity_lines,
            min_working_days_lines,
            curriculum_compactness_lines,
            room_stability_lines,
        }
    }

    pub fn lectures(&self) -> u64 {
        self.lectures
    }
    pub fn conflicts(&self) -> u64 {
        self.conflicts
    }
    pub fn availability(&self) -> u64 {
        self.availability
    }
    pub fn room_occupation(&self) -> u64 {
        self.room_occupation
    }
    pub fn room_capacity(&self) -> u64 {
        self.room_capacity
    }
    pub fn min_working_days(&self) -> u64 {
        self.min_working_days
    }
    pub fn curriculum_compactness(&self) -> u64 {
        self.curriculum_compactness
    }
    pub fn room_stability(&self) -> u64 {
        self.room_stability
    }

    pub fn total_violation_cost(&self) -> u64 {
        self.lectures + self.conflicts + self.availability + self.room_occupation
    }

    pub fn total_soft_cost(&self) -> u64 {
        self.room_capacity
            + self.min_working_days * MIN_WORKING_DAYS_COST
            + self.curriculum_compactness * CURRICULUM_COMPACTNESS_COST
            + self.room_stability * ROOM_STABILITY_COST
    }

    fn eval_lectures(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        for (c, course) in faculty.courses.iter().enumerate() {
            let course_id = CourseId::from_index(c);
            let assigned = (0..faculty.total_periods())
                .filter(|&p| timetable.room_at(course_id, p) != 0)
                .count() as u64;
            let required = course.lectures as u64;
            if assigned < required {
                let diff = required - assigned;
                total += diff;
                lines.push(Line {
                    text: format!("Too few lectures for course {}", course.name),
                    weight: diff,
                });
            } else if assigned > required {
                let diff = assigned - required;
                total += diff;
                lines.push(Line {
                    text: format!("Too many lectures for course {}", course.name),
                    weight: diff,
                });
            }
        }
        (total, lines)
    }

    fn eval_conflicts(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        for c1 in 0..faculty.num_courses() {
            let course_1 = CourseId::from_index(c1);
            for c2 in faculty.conflict(course_1).iter().filter(|&c2| c2 > c1) {
                let course_2 = CourseId::from_index(c2);
                for p in 0..faculty.total_periods() {
                    if timetable.room_at(course_1, p) != 0 && timetable.room_at(course_2, p) != 0 {
                        total += 1;
                        lines.push(Line {
                            text: format!(
                                "Courses {} and {} have both a lecture at {}",
                                faculty.course(course_1).name,
                                faculty.course(course_2).name,
                                period_suffix(faculty, p)
                            ),
                            weight: 1,
                        });
                    }
                }
            }
        }
        (total, lines)
    }

    fn eval_availability(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        for c in 0..faculty.num_courses() {
            let course_id = CourseId::from_index(c);
            for p in 0..faculty.total_periods() {
                if timetable.room_at(course_id, p) != 0 && !faculty.is_available(course_id, p) {
                    total += 1;
                    lines.push(Line {
                        text: format!(
                            "Course {} has a lecture at unavailable {}",
                            faculty.course(course_id).name,
                            period_suffix(faculty, p)
                        ),
                        weight: 1,
                    });
                }
            }
        }
        (total, lines)
    }

    fn eval_room_occupation(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        for p in 0..faculty.total_periods() {
            for room_number in 0..timetable.num_room_slots() as u32 {
                let count = timetable.room_lectures_by_number(room_number, p);
                if count > 1 {
                    let excess = (count - 1) as u64;
                    total += excess;
                    let room_name = if room_number == 0 {
                        "<none>".to_string()
                    } else {
                        faculty
                            .room(crate::faculty::RoomId::from_room_number(room_number))
                            .name
                            .clone()
                    };
                    let mut text = format!(
                        "{count} lectures in room {room_name} the {}",
                        period_suffix(faculty, p)
                    );
                    if count > 2 {
                        text.push_str(&format!(" [{excess} violations]"));
                    }
                    lines.push(Line { text, weight: excess });
                }
            }
        }
        (total, lines)
    }

    fn eval_room_capacity(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        for c in 0..faculty.num_courses() {
            let course_id = CourseId::from_index(c);
            let course = faculty.course(course_id);
            for p in 0..faculty.total_periods() {
                let room_number = timetable.room_at(course_id, p);
                if room_number == 0 {
                    continue;
                }
                let room = faculty.room(crate::faculty::RoomId::from_room_number(room_number));
                if room.capacity < course.students {
                    let deficit = (course.students - room.capacity) as u64;
                    total += deficit;
                    lines.push(Line {
                        text: format!(
                            "Room {} too small for course {} the {}",
                            room.name,
                            course.name,
                            period_suffix(faculty, p)
                        ),
                        weight: deficit,
                    });
                }
            }
        }
        (total, lines)
    }

    fn eval_min_working_days(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        for c in 0..faculty.num_courses() {
            let course_id = CourseId::from_index(c);
            let course = faculty.course(course_id);
            let actual = timetable.working_days(course_id) as u64;
            let required = course.min_working_days as u64;
            if actual < required {
                let diff = required - actual;
                total += diff;
                lines.push(Line {
                    text: format!("The course {} has only {} days of lecture", course.name, actual),
                    weight: MIN_WORKING_DAYS_COST,
                });
            }
        }
        (total, lines)
    }

    fn eval_curriculum_compactness(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        let periods_per_day = faculty.periods_per_day;

        for (g, curriculum) in faculty.curricula.iter().enumerate() {
            for p in 0..faculty.total_periods() {
                let here = timetable.curriculum_period_lectures(g, p);
                if here == 0 {
                    continue;
                }

                let timeslot = p % periods_per_day;

                let prev_same_day = timeslot > 0 && timetable.curriculum_period_lectures(g, p - 1) > 0;
                let next_same_day =
                    timeslot + 1 < periods_per_day && timetable.curriculum_period_lectures(g, p + 1) > 0;

                if !prev_same_day && !next_same_day {
                    let count = here as u64;
                    total += count;
                    lines.push(Line {
                        text: format!(
                            "Curriculum {} has an isolated lecture at {}",
                            curriculum.name,
                            period_suffix(faculty, p)
                        ),
                        weight: count * CURRICULUM_COMPACTNESS_COST,
                    });
                }
            }
        }
        (total, lines)
    }

    fn eval_room_stability(faculty: &Faculty, timetable: &Timetable) -> (u64, Vec<Line>) {
        let mut total = 0u64;
        let mut lines = Vec::new();
        for c in 0..faculty.num_courses() {
            let course_id = CourseId::from_index(c);
            let used = timetable.used_rooms(course_id).len();
            if used > 1 {
                let excess = (used - 1) as u64;
                total += excess;
                lines.push(Line {
                    text: format!(
                        "Course {} uses {} different rooms",
                        faculty.course(course_id).name,
                        used
                    ),
                    weight: excess * ROOM_STABILITY_COST,
                });
            }
        }
        (total, lines)
    }

    /// Renders the fixed-format report described for the validator: the
    /// full violation section (all eight categories back to back, no
    /// inter-category blanks) followed by one blank line, then the eight
    /// `Violations of` / `Cost of` summary lines followed by one blank
    /// line, then a single `Summary:` line.
    pub fn report(&self, mut out: impl Write) -> io::Result<()> {
        let hard_lines = |out: &mut dyn Write, lines: &[Line]| -> io::Result<()> {
            for line in lines {
                writeln!(out, "[H] {}", line.text)?;
            }
            Ok(())
        };
        let soft_lines = |out: &mut dyn Write, lines: &[Line]| -> io::Result<()> {
            for line in lines {
                writeln!(out, "[S({})] {}", line.weight, line.text)?;
            }
            Ok(())
        };

        hard_lines(&mut out, &self.lectures_lines)?;
        hard_lines(&mut out, &self.conflicts_lines)?;
        hard_lines(&mut out, &self.availability_lines)?;
        hard_lines(&mut out, &self.room_occupation_lines)?;
        soft_lines(&mut out, &self.room_capacity_lines)?;
        soft_lines(&mut out, &self.min_working_days_lines)?;
        soft_lines(&mut out, &self.curriculum_compactness_lines)?;
        soft_lines(&mut out, &self.room_stability_lines)?;
        writeln!(out)?;

        writeln!(out, "Violations of Lectures (hard) : {}", self.lectures)?;
        writeln!(out, "Violations of Conflicts (hard) : {}", self.conflicts)?;
        writeln!(out, "Violations of Availability (hard) : {}", self.availability)?;
        writeln!(out, "Violations of RoomOccupation (hard) : {}", self.room_occupation)?;
        writeln!(out, "Cost of RoomCapacity (soft) : {}", self.room_capacity)?;
        writeln!(
            out,
            "Cost of MinWorkingDays (soft) : {}",
            self.min_working_days * MIN_WORKING_DAYS_COST
        )?;
        writeln!(
            out,
            "Cost of CurriculumCompactness (soft) : {}",
            self.curriculum_compactness * CURRICULUM_COMPACTNESS_COST
        )?;
        writeln!(
            out,
            "Cost of RoomStability (soft) : {}",
            self.room_stability * ROOM_STABILITY_COST
        )?;
        writeln!(out)?;

        let violations = self.total_violation_cost();
        let total_cost = self.total_soft_cost();
        if violations > 0 {
            writeln!(out, "Summary: Violations = {violations}, Total Cost = {total_cost}")?;
        } else {
            writeln!(out, "Summary: Total Cost = {total_cost}")?;
        }

        Ok(())
    }

    pub fn timetable(&self) -> &'t Timetable<'f> {
        self.timetable
    }

    pub fn faculty(&self) -> &'f Faculty {
        self.faculty
    }
}

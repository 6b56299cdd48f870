//! In-memory student roster and today's attendance marks.
//!
//! The demo service keeps everything in memory: registered students, which
//! cards have a stored face, and who has been marked present today.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub rfid: String,
    pub roll: String,
    pub name: String,
    pub email: String,
}

/// Result of trying to mark a card present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// First mark of the day; carries the student's name for the message.
    Marked { name: String },
    AlreadyPresent,
    Unknown,
}

#[derive(Debug, Default)]
struct RosterInner {
    students: Vec<Student>,
    /// Cards with a stored face.
    faces: HashSet<String>,
    /// Card → time marked present, for today.
    present: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct Roster {
    inner: Mutex<RosterInner>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, rfid: &str) -> bool {
        self.lock().students.iter().any(|s| s.rfid == rfid)
    }

    pub fn get(&self, rfid: &str) -> Option<Student> {
        self.lock().students.iter().find(|s| s.rfid == rfid).cloned()
    }

    /// Stores a face for `rfid`. Faces may arrive before the student record
    /// does; enrollment captures the face first and registers afterwards.
    pub fn record_face(&self, rfid: &str) {
        self.lock().faces.insert(rfid.to_owned());
    }

    pub fn has_face(&self, rfid: &str) -> bool {
        self.lock().faces.contains(rfid)
    }

    /// Adds a student; `false` if the card is already registered.
    pub fn register(&self, student: Student) -> bool {
        let mut inner = self.lock();
        if inner.students.iter().any(|s| s.rfid == student.rfid) {
            return false;
        }
        inner.students.push(student);
        true
    }

    /// Marks `rfid` present at `time`.
    pub fn mark_present(&self, rfid: &str, time: String) -> MarkOutcome {
        let mut inner = self.lock();
        let Some(student) = inner.students.iter().find(|s| s.rfid == rfid) else {
            return MarkOutcome::Unknown;
        };
        let name = student.name.clone();
        if inner.present.contains_key(rfid) {
            return MarkOutcome::AlreadyPresent;
        }
        inner.present.insert(rfid.to_owned(), time);
        MarkOutcome::Marked { name }
    }

    /// Time at which `rfid` was marked present today, if it was.
    pub fn marked_at(&self, rfid: &str) -> Option<String> {
        self.lock().present.get(rfid).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, RosterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

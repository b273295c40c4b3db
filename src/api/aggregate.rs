use std::future::Future;

use futures::future::join_all;

use super::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{HistoryEvent, Id, Medication, Student};

/// Items gathered across several students, plus the fetches that failed.
#[derive(Debug)]
pub struct Aggregate<T> {
    pub items: Vec<T>,
    pub failures: Vec<FetchFailure>,
}

#[derive(Debug)]
pub struct FetchFailure {
    pub student_id: Id,
    pub error: ClientError,
}

impl<T> Aggregate<T> {
    /// Some students' data is missing.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl<T> Default for Aggregate<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Run `fetch` for every student concurrently and concatenate the results in
/// input order. A failed fetch is recorded and does not affect the others.
async fn fan_out<T, F, Fut>(students: &[Student], fetch: F) -> Aggregate<T>
where
    F: Fn(Id) -> Fut,
    Fut: Future<Output = ClientResult<Vec<T>>>,
{
    let results = join_all(students.iter().map(|s| fetch(s.id))).await;

    let mut aggregate = Aggregate::default();
    for (student, result) in students.iter().zip(results) {
        match result {
            Ok(items) => aggregate.items.extend(items),
            Err(error) => {
                tracing::warn!("Fetch for student {} failed: {}", student.id, error);
                aggregate.failures.push(FetchFailure {
                    student_id: student.id,
                    error,
                });
            }
        }
    }
    aggregate
}

impl ApiClient {
    /// Every medication of every student in `students`, in input order.
    pub async fn get_medications_for_students(
        &self,
        students: &[Student],
    ) -> Aggregate<Medication> {
        fan_out(students, |id| self.get_medications_by_student(id)).await
    }

    /// Crisis events ("crise"/"surto") recorded for `students`, in input
    /// order and in the order the backend returned them per student.
    pub async fn get_crisis_history_for_students(
        &self,
        students: &[Student],
    ) -> Aggregate<HistoryEvent> {
        let mut aggregate = fan_out(students, |id| self.get_history_by_user(id)).await;
        aggregate.items.retain(HistoryEvent::is_crisis);
        aggregate
    }
}

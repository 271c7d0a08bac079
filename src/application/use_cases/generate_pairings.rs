use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::application::{AssignmentRepository, StudentRepository, TemplateRepository};
use crate::domain::{ActivityGroup, ActivityTemplate, DomainError, Student};

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub template_id: i64,
    pub name: String,
    pub objective: String,
}

/// Two students (three when the class size is odd) assigned one activity.
#[derive(Debug, Clone, Serialize)]
pub struct Pairing {
    pub student1_id: i64,
    pub student1_name: String,
    pub student2_id: i64,
    pub student2_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student3_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student3_name: Option<String>,
    pub activity_template: TemplateSummary,
    /// Id of the persisted activity group, once saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairingPlan {
    pub class_id: i64,
    pub pairings: Vec<Pairing>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub saved_groups: Vec<ActivityGroup>,
}

pub struct GeneratePairingsUseCase {
    student_repo: Arc<dyn StudentRepository>,
    template_repo: Arc<dyn TemplateRepository>,
    assignment_repo: Arc<dyn AssignmentRepository>,
}

impl GeneratePairingsUseCase {
    pub fn new(
        student_repo: Arc<dyn StudentRepository>,
        template_repo: Arc<dyn TemplateRepository>,
        assignment_repo: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            student_repo,
            template_repo,
            assignment_repo,
        }
    }

    pub async fn execute(
        &self,
        class_id: i64,
        template_id: Option<i64>,
        save: bool,
    ) -> Result<PairingPlan, DomainError> {
        let students = self.student_repo.list().await?;
        if students.len() < 2 {
            return Err(DomainError::invalid_input("Not enough students for pairings"));
        }

        let template = self.resolve_template(class_id, template_id).await?;
        let mut pairings = pair_students(&students, &template)?;
        info!(
            "Paired {} students into {} groups for class {} using '{}'",
            students.len(),
            pairings.len(),
            class_id,
            template.name
        );

        let mut saved_groups = Vec::new();
        if save {
            let today = chrono::Local::now().date_naive();
            for pairing in pairings.iter_mut() {
                let group = self.save_group(pairing, today).await?;
                pairing.group_id = group.group_id;
                saved_groups.push(group);
            }
            info!("Saved {} activity groups", saved_groups.len());
        }

        Ok(PairingPlan {
            class_id,
            pairings,
            saved_groups,
        })
    }

    async fn resolve_template(
        &self,
        class_id: i64,
        template_id: Option<i64>,
    ) -> Result<ActivityTemplate, DomainError> {
        match template_id {
            Some(id) => self
                .template_repo
                .find_activity_template(id)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found(format!("Activity template with ID {} not found", id))
                }),
            None => self
                .template_repo
                .find_activity_template_for_class(class_id)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found(format!(
                        "No activity templates found for class {}",
                        class_id
                    ))
                }),
        }
    }

    async fn save_group(
        &self,
        pairing: &Pairing,
        completion_date: NaiveDate,
    ) -> Result<ActivityGroup, DomainError> {
        let group = ActivityGroup::new(
            pairing.activity_template.template_id,
            pairing.student1_id,
            pairing.student2_id,
            completion_date,
        );
        self.assignment_repo.insert_activity_group(&group).await
    }
}

/// Pairs students by list position: 0-1, 2-3, ... An odd student out joins
/// the last pair.
pub fn pair_students(
    students: &[Student],
    template: &ActivityTemplate,
) -> Result<Vec<Pairing>, DomainError> {
    let summary = TemplateSummary {
        template_id: template.id()?,
        name: template.name.clone(),
        objective: template.objective.clone(),
    };

    let mut pairings = students
        .chunks_exact(2)
        .map(|pair| {
            Ok(Pairing {
                student1_id: pair[0].id()?,
                student1_name: pair[0].full_name(),
                student2_id: pair[1].id()?,
                student2_name: pair[1].full_name(),
                student3_id: None,
                student3_name: None,
                activity_template: summary.clone(),
                group_id: None,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    if students.len() % 2 == 1 {
        if let (Some(last), Some(pairing)) = (students.last(), pairings.last_mut()) {
            pairing.student3_id = Some(last.id()?);
            pairing.student3_name = Some(last.full_name());
        }
    }

    Ok(pairings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConversationTemplate;

    fn students(n: i64) -> Vec<Student> {
        (1..=n)
            .map(|i| {
                Student::new(
                    format!("First{}", i),
                    format!("Last{}", i),
                    format!("s{}@example.com", i),
                    "Intermediate",
                )
                .with_id(i)
            })
            .collect()
    }

    fn activity() -> ActivityTemplate {
        ActivityTemplate::new(
            "Restaurant Role-play",
            "Order food",
            "Beginner",
            1,
            ConversationTemplate::default(),
        )
        .with_id(7)
    }

    #[test]
    fn even_class_pairs_consecutively() {
        let pairings = pair_students(&students(4), &activity()).unwrap();

        assert_eq!(pairings.len(), 2);
        assert_eq!((pairings[0].student1_id, pairings[0].student2_id), (1, 2));
        assert_eq!((pairings[1].student1_id, pairings[1].student2_id), (3, 4));
        assert!(pairings.iter().all(|p| p.student3_id.is_none()));
        assert_eq!(pairings[0].activity_template.template_id, 7);
        assert!(pairings.iter().all(|p| p.group_id.is_none()));
    }

    #[test]
    fn odd_student_joins_last_pair() {
        let pairings = pair_students(&students(5), &activity()).unwrap();

        assert_eq!(pairings.len(), 2);
        assert_eq!(pairings[1].student3_id, Some(5));
        assert_eq!(pairings[1].student3_name.as_deref(), Some("First5 Last5"));
        assert_eq!(pairings[0].student3_id, None);
    }

    #[test]
    fn pair_count_is_half_the_class() {
        for n in 2..12 {
            let pairings = pair_students(&students(n), &activity()).unwrap();
            assert_eq!(pairings.len() as i64, n / 2);
        }
    }
}

//! End-to-end tests for sync, homework generation and pairings.
//!
//! Records live in an in-memory DuckDB database, vectors in the in-memory
//! repository, and the embedding and chat adapters are the offline mocks.

use std::sync::Arc;

use esl_rag::{
    open_in_memory_record_connection, ActivityTemplate, AssignmentRepository, Collection,
    ConversationTemplate, DuckdbAssignmentRepository, DuckdbStudentRepository,
    DuckdbTemplateRepository, EmbeddingService, FindCompatibleStudentsUseCase,
    GenerateHomeworkUseCase, GeneratePairingsUseCase, HomeworkRequest, HomeworkTemplate,
    ImportBundle, ImportRecordsUseCase, InMemoryVectorRepository, Interest, MockChatClient,
    MockEmbedding, Question, SearchTemplatesUseCase, StoreStatsUseCase, Student,
    StudentRepository, SyncRecordsUseCase, TemplateRepository, VectorRepository,
};

struct TestEnv {
    students: Arc<dyn StudentRepository>,
    templates: Arc<dyn TemplateRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    vectors: Arc<dyn VectorRepository>,
    embeddings: Arc<dyn EmbeddingService>,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_vectors(Arc::new(InMemoryVectorRepository::new()))
    }

    /// Fresh record store synced into an existing vector repository.
    fn with_vectors(vectors: Arc<dyn VectorRepository>) -> Self {
        let conn = open_in_memory_record_connection().expect("Failed to open DuckDB");
        Self {
            students: Arc::new(DuckdbStudentRepository::with_connection(Arc::clone(&conn))),
            templates: Arc::new(DuckdbTemplateRepository::with_connection(Arc::clone(&conn))),
            assignments: Arc::new(DuckdbAssignmentRepository::with_connection(conn)),
            vectors,
            embeddings: Arc::new(MockEmbedding::new()),
        }
    }

    fn import_use_case(&self) -> ImportRecordsUseCase {
        ImportRecordsUseCase::new(self.students.clone(), self.templates.clone())
    }

    fn sync_use_case(&self) -> SyncRecordsUseCase {
        SyncRecordsUseCase::new(
            self.students.clone(),
            self.templates.clone(),
            self.vectors.clone(),
            self.embeddings.clone(),
        )
    }

    fn homework_use_case(&self, chat: Arc<MockChatClient>) -> GenerateHomeworkUseCase {
        GenerateHomeworkUseCase::new(
            self.students.clone(),
            self.templates.clone(),
            self.assignments.clone(),
            self.vectors.clone(),
            self.embeddings.clone(),
            chat,
        )
    }

    fn pairings_use_case(&self) -> GeneratePairingsUseCase {
        GeneratePairingsUseCase::new(
            self.students.clone(),
            self.templates.clone(),
            self.assignments.clone(),
        )
    }

    fn stats_use_case(&self) -> StoreStatsUseCase {
        StoreStatsUseCase::new(
            self.students.clone(),
            self.templates.clone(),
            self.assignments.clone(),
            self.vectors.clone(),
        )
    }

    /// Imports `n` students plus two homework templates in different classes
    /// and one activity template for class 1.
    async fn seed(&self, n: usize) {
        let levels = ["Beginner", "Intermediate", "Advanced"];
        let students = (0..n)
            .map(|i| {
                Student::new(
                    format!("Student{}", i),
                    "Test",
                    format!("student{}@example.com", i),
                    levels[i % levels.len()],
                )
                .with_interest(Interest::new("Cooking", "Food", "Bakes bread"))
            })
            .collect();

        let bundle = ImportBundle {
            students,
            homework_templates: vec![
                HomeworkTemplate::new(
                    "Business English Communication",
                    "Practice professional email writing",
                    "Intermediate",
                    1,
                )
                .with_question(
                    Question::new("Write an email explaining a project delay.")
                        .with_instructions("Use business email format."),
                ),
                HomeworkTemplate::new(
                    "Travel Vocabulary",
                    "Airport and hotel phrases",
                    "Beginner",
                    2,
                )
                .with_question(Question::new("Describe your last holiday.")),
            ],
            activity_templates: vec![ActivityTemplate::new(
                "Business Meeting Simulation",
                "Practice meeting vocabulary",
                "Intermediate",
                1,
                ConversationTemplate::new("A product meeting", "Student 1 chairs.")
                    .with_prompt("Reach a decision"),
            )],
        };

        self.import_use_case()
            .execute(bundle)
            .await
            .expect("Failed to import seed data");
    }
}

#[tokio::test]
async fn sync_writes_one_document_per_record() {
    let env = TestEnv::new();
    env.seed(5).await;

    let report = env.sync_use_case().execute(false).await.expect("sync");

    assert_eq!(report.homework_templates.total(), 2);
    assert_eq!(report.activity_templates.total(), 1);
    assert_eq!(report.student_profiles.total(), 5);
    assert_eq!(report.student_profiles.synced_ids, vec![1, 2, 3, 4, 5]);

    assert_eq!(env.vectors.count(Collection::HomeworkTemplates).await.unwrap(), 2);
    assert_eq!(env.vectors.count(Collection::ActivityTemplates).await.unwrap(), 1);
    assert_eq!(env.vectors.count(Collection::StudentProfiles).await.unwrap(), 5);

    let profile = env
        .vectors
        .get(Collection::StudentProfiles, "student_profile_3")
        .await
        .unwrap()
        .expect("synced profile");
    assert!(profile.text().starts_with("Student: Student2 Test"));
    assert_eq!(profile.metadata_value("student_id"), Some("3"));
}

#[tokio::test]
async fn second_sync_skips_unchanged_documents() {
    let env = TestEnv::new();
    env.seed(3).await;
    let sync = env.sync_use_case();

    let first = sync.execute(false).await.expect("first sync");
    assert_eq!(first.student_profiles.written, 3);

    let second = sync.execute(false).await.expect("second sync");
    assert_eq!(second.student_profiles.written, 0);
    assert_eq!(second.student_profiles.unchanged, 3);
    assert_eq!(second.student_profiles.total(), 3);

    let forced = sync.execute(true).await.expect("forced sync");
    assert_eq!(forced.student_profiles.written, 3);
    assert_eq!(env.vectors.count(Collection::StudentProfiles).await.unwrap(), 3);
}

#[tokio::test]
async fn sync_removes_documents_without_records() {
    let first = TestEnv::new();
    first.seed(3).await;
    first.sync_use_case().execute(false).await.expect("first store sync");
    assert_eq!(first.vectors.count(Collection::HomeworkTemplates).await.unwrap(), 2);

    let second = TestEnv::with_vectors(first.vectors.clone());
    let bundle = ImportBundle {
        students: vec![Student::new("Only", "One", "only@example.com", "Beginner")],
        homework_templates: vec![HomeworkTemplate::new(
            "Business English Communication",
            "Practice professional email writing",
            "Intermediate",
            1,
        )
        .with_question(Question::new("Write an email explaining a project delay."))],
        activity_templates: vec![],
    };
    second.import_use_case().execute(bundle).await.expect("import");

    let report = second.sync_use_case().execute(true).await.expect("second store sync");
    assert_eq!(report.homework_templates.removed, 1);
    assert_eq!(report.activity_templates.removed, 1);
    assert_eq!(report.student_profiles.removed, 2);

    assert_eq!(second.vectors.count(Collection::HomeworkTemplates).await.unwrap(), 1);
    assert_eq!(second.vectors.count(Collection::ActivityTemplates).await.unwrap(), 0);
    assert_eq!(second.vectors.count(Collection::StudentProfiles).await.unwrap(), 1);
    assert_eq!(
        second
            .vectors
            .list_ids(Collection::HomeworkTemplates)
            .await
            .unwrap(),
        vec!["homework_template_1"]
    );

    let err = second
        .homework_use_case(Arc::new(MockChatClient::new()))
        .execute(&HomeworkRequest::new(1).with_class(Some(2)))
        .await
        .expect_err("class 2 has no template left");
    assert_eq!(err.message(), "No suitable homework templates found");

    let again = second.sync_use_case().execute(false).await.expect("resync");
    assert_eq!(again.homework_templates.removed, 0);
    assert_eq!(again.homework_templates.unchanged, 1);
}

#[tokio::test]
async fn homework_is_personalized_and_saved() {
    let env = TestEnv::new();
    env.seed(2).await;
    env.sync_use_case().execute(false).await.expect("sync");

    let chat = Arc::new(MockChatClient::new());
    let use_case = env.homework_use_case(chat.clone());

    let report = use_case
        .execute(&HomeworkRequest::new(1).with_template(Some(1)))
        .await
        .expect("homework");

    assert_eq!(report.template_id, 1);
    assert_eq!(report.student_name, "Student0 Test");
    assert_eq!(report.template_name, "Business English Communication");
    assert_eq!(report.personalized_questions.len(), 2);
    assert!(report.homework_id.is_some());
    assert_eq!(report.template_questions.len(), 1);

    let prompts = chat.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("STUDENT PROFILE"));
    assert!(prompts[0].contains("Write an email explaining a project delay."));

    let saved = env.assignments.list_homework_for_student(1).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].personalized_questions, report.personalized_questions);
}

#[tokio::test]
async fn homework_without_template_uses_retrieval_within_class() {
    let env = TestEnv::new();
    env.seed(2).await;
    env.sync_use_case().execute(false).await.expect("sync");

    let use_case = env.homework_use_case(Arc::new(MockChatClient::new()));
    let report = use_case
        .execute(&HomeworkRequest::new(2).with_class(Some(2)).without_save())
        .await
        .expect("homework");

    assert_eq!(report.template_id, 2);
    assert_eq!(report.homework_id, None);
    assert_eq!(env.assignments.count_homework().await.unwrap(), 0);
}

#[tokio::test]
async fn homework_reports_missing_records() {
    let env = TestEnv::new();
    env.seed(1).await;
    let use_case = env.homework_use_case(Arc::new(MockChatClient::new()));

    let err = use_case
        .execute(&HomeworkRequest::new(42))
        .await
        .expect_err("unknown student");
    assert!(err.is_not_found());
    assert_eq!(err.message(), "Student with ID 42 not found");

    let err = use_case
        .execute(&HomeworkRequest::new(1).with_template(Some(99)))
        .await
        .expect_err("unknown template");
    assert_eq!(err.message(), "Homework template with ID 99 not found");

    // Nothing synced yet, so retrieval finds no template.
    let err = use_case
        .execute(&HomeworkRequest::new(1))
        .await
        .expect_err("empty vector store");
    assert_eq!(err.message(), "No suitable homework templates found");
}

#[tokio::test]
async fn unparseable_llm_response_saves_nothing() {
    let env = TestEnv::new();
    env.seed(1).await;
    let chat = Arc::new(MockChatClient::with_response("I'm sorry, I can't help with that."));
    let use_case = env.homework_use_case(chat);

    let result = use_case
        .execute(&HomeworkRequest::new(1).with_template(Some(1)))
        .await;

    assert!(result.is_err());
    assert_eq!(env.assignments.count_homework().await.unwrap(), 0);
}

#[tokio::test]
async fn pairings_cover_every_student() {
    let env = TestEnv::new();
    env.seed(5).await;

    let plan = env
        .pairings_use_case()
        .execute(1, None, true)
        .await
        .expect("pairings");

    assert_eq!(plan.class_id, 1);
    assert_eq!(plan.pairings.len(), 2);
    assert_eq!(plan.pairings[1].student3_id, Some(5));
    assert_eq!(
        plan.pairings[0].activity_template.name,
        "Business Meeting Simulation"
    );
    assert_eq!(plan.saved_groups.len(), 2);
    assert_eq!(env.assignments.list_activity_groups().await.unwrap().len(), 2);

    let group_ids: Vec<Option<i64>> = plan.pairings.iter().map(|p| p.group_id).collect();
    let saved_ids: Vec<Option<i64>> = plan.saved_groups.iter().map(|g| g.group_id).collect();
    assert_eq!(group_ids, saved_ids);
    assert!(group_ids.iter().all(Option::is_some));
}

#[tokio::test]
async fn pairings_report_missing_inputs() {
    let env = TestEnv::new();
    env.seed(1).await;
    let use_case = env.pairings_use_case();

    let err = use_case.execute(1, None, false).await.expect_err("one student");
    assert_eq!(err.message(), "Not enough students for pairings");

    env.students
        .insert(&Student::new("Late", "Joiner", "late@example.com", "Beginner"))
        .await
        .expect("insert");
    let err = use_case.execute(7, None, false).await.expect_err("no template");
    assert_eq!(err.message(), "No activity templates found for class 7");

    let err = use_case
        .execute(1, Some(99), false)
        .await
        .expect_err("unknown template");
    assert_eq!(err.message(), "Activity template with ID 99 not found");

    let plan = use_case.execute(1, None, false).await.expect("pairings");
    assert_eq!(plan.pairings.len(), 1);
    assert_eq!(plan.pairings[0].group_id, None);
    assert!(plan.saved_groups.is_empty());
    assert!(env.assignments.list_activity_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_and_compatibility_use_synced_documents() {
    let env = TestEnv::new();
    env.seed(4).await;
    env.sync_use_case().execute(false).await.expect("sync");

    let search = SearchTemplatesUseCase::new(env.vectors.clone(), env.embeddings.clone());
    let results = search
        .search(
            Collection::HomeworkTemplates,
            "airport hotel travel vocabulary",
            5,
            None,
            None,
        )
        .await
        .expect("search");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record_id("template_id"), Some(2));

    let filtered = search
        .search(Collection::HomeworkTemplates, "travel", 5, Some(1), None)
        .await
        .expect("filtered search");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].record_id("template_id"), Some(1));

    assert!(search
        .search(Collection::StudentProfiles, "anything", 5, None, None)
        .await
        .is_err());

    let compatible =
        FindCompatibleStudentsUseCase::new(env.vectors.clone(), env.embeddings.clone());
    let matches = compatible.execute(1, 10, None).await.expect("compatible");
    assert_eq!(matches.len(), 3);
    assert!(matches.iter().all(|m| m.record_id("student_id") != Some(1)));

    let advanced = compatible
        .execute(1, 10, Some("Advanced"))
        .await
        .expect("compatible by level");
    assert_eq!(advanced.len(), 1);
    assert_eq!(advanced[0].record_id("student_id"), Some(3));

    let err = compatible.execute(40, 5, None).await.expect_err("unsynced");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn stats_flag_collections_behind_the_record_store() {
    let env = TestEnv::new();
    env.seed(2).await;

    let before = env.stats_use_case().initialize().await.expect("stats");
    assert_eq!(before.students, 2);
    assert_eq!(before.homework_templates, 2);
    assert_eq!(
        before.stale_collections(),
        vec!["homework_templates", "activity_templates", "student_profiles"]
    );

    env.sync_use_case().execute(false).await.expect("sync");
    let after = env.stats_use_case().execute().await.expect("stats");
    assert!(after.stale_collections().is_empty());
    assert_eq!(after.vector_documents.get("student_profiles"), Some(&2));
}

#[tokio::test]
async fn import_skips_existing_emails() {
    let env = TestEnv::new();
    env.seed(2).await;

    let bundle: ImportBundle = serde_json::from_value(serde_json::json!({
        "students": [
            {"first_name": "Student0", "last_name": "Again", "email": "student0@example.com",
             "proficiency_level": "Beginner"},
            {"first_name": "New", "last_name": "Person", "email": "new@example.com",
             "proficiency_level": "Beginner"}
        ]
    }))
    .expect("bundle");
    let report = env.import_use_case().execute(bundle).await.expect("import");

    assert_eq!(report.students, vec![3]);
    assert_eq!(report.skipped_students, vec!["student0@example.com"]);
    assert!(report.homework_templates.is_empty());
    assert_eq!(env.students.count().await.unwrap(), 3);
}

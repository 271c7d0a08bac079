use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{
    CompatibleController, HomeworkController, ImportController, InitController,
    PairingsController, SearchController, StatsController, SyncController,
};

pub struct Router<'a> {
    init_controller: InitController<'a>,
    import_controller: ImportController<'a>,
    sync_controller: SyncController<'a>,
    homework_controller: HomeworkController<'a>,
    pairings_controller: PairingsController<'a>,
    search_controller: SearchController<'a>,
    compatible_controller: CompatibleController<'a>,
    stats_controller: StatsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            init_controller: InitController::new(container),
            import_controller: ImportController::new(container),
            sync_controller: SyncController::new(container),
            homework_controller: HomeworkController::new(container),
            pairings_controller: PairingsController::new(container),
            search_controller: SearchController::new(container),
            compatible_controller: CompatibleController::new(container),
            stats_controller: StatsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Init => self.init_controller.init().await,
            Commands::Import { file } => self.import_controller.import(file).await,
            Commands::Sync { force } => self.sync_controller.sync(force).await,
            Commands::Homework {
                student_id,
                template_id,
                class_id,
                no_save,
                output,
            } => {
                self.homework_controller
                    .homework(student_id, template_id, class_id, no_save, output)
                    .await
            }
            Commands::Pairings {
                class_id,
                template_id,
                no_save,
                output,
            } => {
                self.pairings_controller
                    .pairings(class_id, template_id, no_save, output)
                    .await
            }
            Commands::Search {
                query,
                kind,
                class_id,
                level,
                num,
            } => {
                self.search_controller
                    .search(query, kind, class_id, level, num)
                    .await
            }
            Commands::Compatible {
                student_id,
                num,
                level,
            } => {
                self.compatible_controller
                    .compatible(student_id, num, level)
                    .await
            }
            Commands::Stats => self.stats_controller.stats().await,
            Commands::Server { .. } => {
                unreachable!("server command is handled separately in main")
            }
        }
    }
}

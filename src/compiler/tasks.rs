//! Maintenance-task manifests (`task_schedule.xml`).

use crate::player_store::PendingTasks;
use quick_xml::escape::escape;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Reboot,
    ClearWebCache,
    ClearPlayerCache,
    ApplyUrlList { source_url: String },
    ApplyConfiguration { source_url: String },
    FirmwareUpdate { source_url: String, version: String },
}

impl TaskKind {
    fn type_name(&self) -> &'static str {
        match self {
            TaskKind::Reboot => "reboot",
            TaskKind::ClearWebCache => "clearWebCache",
            TaskKind::ClearPlayerCache => "clearPlayerCache",
            TaskKind::ApplyUrlList { .. } => "applyUrlList",
            TaskKind::ApplyConfiguration { .. } => "applyConfiguration",
            TaskKind::FirmwareUpdate { .. } => "firmwareUpdate",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: String,
    pub kind: TaskKind,
}

#[derive(Debug, Default)]
pub struct TaskScheduleCompiler {
    tasks: Vec<ScheduledTask>,
}

impl TaskScheduleCompiler {
    /// Queues every pending task, each under a fresh id.
    pub fn from_pending(pending: &PendingTasks) -> Self {
        let mut compiler = Self::default();
        if pending.reboot {
            compiler.add(TaskKind::Reboot);
        }
        if pending.clear_web_cache {
            compiler.add(TaskKind::ClearWebCache);
        }
        if pending.clear_player_cache {
            compiler.add(TaskKind::ClearPlayerCache);
        }
        if let Some(url) = &pending.url_list {
            compiler.add(TaskKind::ApplyUrlList {
                source_url: url.clone(),
            });
        }
        if let Some(url) = &pending.configuration {
            compiler.add(TaskKind::ApplyConfiguration {
                source_url: url.clone(),
            });
        }
        if let Some(firmware) = &pending.firmware {
            compiler.add(TaskKind::FirmwareUpdate {
                source_url: firmware.source_url.clone(),
                version: firmware.version.clone(),
            });
        }
        compiler
    }

    pub fn add(&mut self, kind: TaskKind) {
        self.tasks.push(ScheduledTask {
            id: Uuid::new_v4().to_string(),
            kind,
        });
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn render(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<task_schedule>\n");
        for task in &self.tasks {
            xml.push_str("    <task>\n");
            xml.push_str(&format!("        <id>{}</id>\n", task.id));
            xml.push_str(&format!("        <type>{}</type>\n", task.kind.type_name()));
            match &task.kind {
                TaskKind::ApplyUrlList { source_url } | TaskKind::ApplyConfiguration { source_url } => {
                    xml.push_str(&format!(
                        "        <sourceURL>{}</sourceURL>\n",
                        escape(source_url.as_str())
                    ));
                }
                TaskKind::FirmwareUpdate {
                    source_url,
                    version,
                } => {
                    xml.push_str(&format!(
                        "        <sourceURL>{}</sourceURL>\n",
                        escape(source_url.as_str())
                    ));
                    xml.push_str(&format!(
                        "        <version>{}</version>\n",
                        escape(version.as_str())
                    ));
                }
                TaskKind::Reboot | TaskKind::ClearWebCache | TaskKind::ClearPlayerCache => {}
            }
            xml.push_str("    </task>\n");
        }
        xml.push_str("</task_schedule>\n");
        xml
    }
}

mod bed;
mod helpers;
mod history;
mod plant;
mod task;

pub(crate) use bed::{cmd_bed_add, cmd_bed_delete, cmd_bed_edit, cmd_bed_list, cmd_bed_show};
pub(crate) use history::{Toggle, cmd_history, cmd_reminders};
pub(crate) use plant::{cmd_plant_add, cmd_plant_list, cmd_plant_options};
pub(crate) use task::{
    cmd_task_add, cmd_task_delete, cmd_task_done, cmd_task_edit, cmd_task_list, cmd_task_photo,
    cmd_task_types,
};

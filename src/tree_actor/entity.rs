use super::actions::{TreeAction, TreeActionResult};
use super::dtos::{TreeCreate, TreePatch};
use crate::actor_framework::{Entity, EntityId};
use crate::domain::Tree;
use crate::error::FarmError;

impl Entity for Tree {
    const KIND: &'static str = "Tree";
    type CreateParams = TreeCreate;
    type Patch = TreePatch;
    type Action = TreeAction;
    type ActionResult = TreeActionResult;
    type Error = FarmError;

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_create_params(id: EntityId, params: TreeCreate) -> Result<Self, FarmError> {
        Ok(Self {
            id,
            variety_id: params.variety_id,
            date_planted: params.date_planted,
            date_removed: None,
            harvest_reports: Vec::new(),
        })
    }

    fn on_update(&mut self, patch: TreePatch) -> Result<(), FarmError> {
        if let Some(variety_id) = patch.variety_id {
            self.variety_id = variety_id;
        }
        if let Some(date_planted) = patch.date_planted {
            self.date_planted = date_planted;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: TreeAction) -> Result<TreeActionResult, FarmError> {
        match action {
            TreeAction::Remove { at } => {
                if let Some(removed) = self.date_removed {
                    return Err(FarmError::InvalidState(format!(
                        "tree {} was already removed on {}",
                        self.id, removed
                    )));
                }
                self.date_removed = Some(at);
                Ok(TreeActionResult::Remove(at))
            }
        }
    }
}

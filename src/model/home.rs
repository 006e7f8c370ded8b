use parking_lot::RwLock;
use tracing::debug;

use super::activity::{Activity, ActivityId, ZoomLevel};
use crate::events::WindowId;

/// Capability set of the shell model as seen by the tabbing coordinator.
///
/// The cyclic order of running activities is owned by the implementation;
/// `current = None` means "relative to the active activity".
pub trait ShellModel: Send + Sync {
    fn zoom_level(&self) -> ZoomLevel;
    fn active_activity(&self) -> Option<Activity>;
    fn tabbing_activity(&self) -> Option<Activity>;
    fn set_tabbing_activity(&self, activity: Option<&Activity>);
    fn next_activity(&self, current: Option<&Activity>) -> Option<Activity>;
    fn previous_activity(&self, current: Option<&Activity>) -> Option<Activity>;
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Forward,
    Backward,
}

#[derive(Debug, Default)]
struct HomeState {
    activities: Vec<Activity>,
    active: Option<ActivityId>,
    tabbing: Option<ActivityId>,
    zoom_level: ZoomLevel,
}

impl HomeState {
    fn position(&self, id: &ActivityId) -> Option<usize> {
        self.activities.iter().position(|a| &a.id == id)
    }

    fn lookup(&self, id: Option<&ActivityId>) -> Option<Activity> {
        id.and_then(|id| self.position(id))
            .map(|index| self.activities[index].clone())
    }

    fn step_from(&self, current: Option<&Activity>, step: Step) -> Option<Activity> {
        let len = self.activities.len();
        if len == 0 {
            return None;
        }

        let anchor = current
            .map(|a| &a.id)
            .or(self.active.as_ref())
            .and_then(|id| self.position(id));

        let index = match (anchor, step) {
            (Some(i), Step::Forward) => (i + 1) % len,
            (Some(i), Step::Backward) => (i + len - 1) % len,
            (None, Step::Forward) => 0,
            (None, Step::Backward) => len - 1,
        };

        Some(self.activities[index].clone())
    }
}

/// In-memory home model: running activities in launch order.
#[derive(Debug, Default)]
pub struct HomeModel {
    state: RwLock<HomeState>,
}

impl HomeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить активность или обновить окно уже известной
    pub fn add_activity(&self, activity: Activity) {
        let mut state = self.state.write();
        match state.position(&activity.id) {
            Some(index) => {
                debug!("Обновлено окно активности: {}", activity);
                state.activities[index].window = activity.window;
            }
            None => {
                debug!("Добавлена активность: {}", activity);
                state.activities.push(activity);
            }
        }
    }

    pub fn remove_activity(&self, id: &ActivityId) -> Option<Activity> {
        let mut state = self.state.write();
        let index = state.position(id)?;
        let removed = state.activities.remove(index);

        if state.active.as_ref() == Some(id) {
            state.active = None;
        }
        if state.tabbing.as_ref() == Some(id) {
            state.tabbing = None;
        }

        debug!("Удалена активность: {}", removed);
        Some(removed)
    }

    /// Заменить список активностей целиком (после потери событий реестра)
    pub fn replace_activities(&self, activities: Vec<Activity>) {
        let mut state = self.state.write();
        state.activities = activities;
        if state.active.as_ref().is_some_and(|id| state.position(id).is_none()) {
            state.active = None;
        }
        if state.tabbing.as_ref().is_some_and(|id| state.position(id).is_none()) {
            state.tabbing = None;
        }
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.state.read().activities.clone()
    }

    pub fn set_active_activity(&self, id: Option<&ActivityId>) {
        let mut state = self.state.write();
        state.active = id.filter(|id| state.position(id).is_some()).cloned();
    }

    /// Отметить активной активность, которой принадлежит окно.
    /// Возвращает false, если окно не принадлежит ни одной активности.
    pub fn set_active_window(&self, window: Option<WindowId>) -> bool {
        let mut state = self.state.write();
        let owner = window.and_then(|w| {
            state
                .activities
                .iter()
                .find(|a| a.window == Some(w))
                .map(|a| a.id.clone())
        });
        let found = owner.is_some();
        state.active = owner;
        found
    }

    pub fn set_zoom_level(&self, zoom_level: ZoomLevel) {
        self.state.write().zoom_level = zoom_level;
    }
}

impl ShellModel for HomeModel {
    fn zoom_level(&self) -> ZoomLevel {
        self.state.read().zoom_level
    }

    fn active_activity(&self) -> Option<Activity> {
        let state = self.state.read();
        state.lookup(state.active.as_ref())
    }

    fn tabbing_activity(&self) -> Option<Activity> {
        let state = self.state.read();
        state.lookup(state.tabbing.as_ref())
    }

    fn set_tabbing_activity(&self, activity: Option<&Activity>) {
        self.state.write().tabbing = activity.map(|a| a.id.clone());
    }

    fn next_activity(&self, current: Option<&Activity>) -> Option<Activity> {
        self.state.read().step_from(current, Step::Forward)
    }

    fn previous_activity(&self, current: Option<&Activity>) -> Option<Activity> {
        self.state.read().step_from(current, Step::Backward)
    }
}

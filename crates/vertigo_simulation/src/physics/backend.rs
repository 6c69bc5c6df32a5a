//! ProbeBackend: выбор реализации `PhysicsQuery` внутри систем
//!
//! Приоритет: `ProbeScene` ресурс (headless) → default Rapier контекст.
//! Нет ни того ни другого → probes не выполняются (system пропускает tick).

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::ReadRapierContext;

use super::query::PhysicsQuery;
use super::rapier::RapierProbe;
use super::scene::ProbeScene;

#[derive(SystemParam)]
pub struct ProbeBackend<'w, 's> {
    scene: Option<Res<'w, ProbeScene>>,
    rapier: ReadRapierContext<'w, 's>,
}

impl ProbeBackend<'_, '_> {
    /// Выполняет `f` с доступным `PhysicsQuery`; `exclude`: собственный collider
    pub fn with_query<R>(&self, exclude: Option<Entity>, f: impl FnOnce(&dyn PhysicsQuery) -> R) -> Option<R> {
        if let Some(scene) = self.scene.as_deref() {
            return Some(f(scene));
        }

        let context = self.rapier.single().ok()?;
        let probe = RapierProbe::new(context, exclude);
        Some(f(&probe))
    }
}

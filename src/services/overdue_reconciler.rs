// src/services/overdue_reconciler.rs
//
// Tarefa de fundo: persiste a transição issued -> overdue de todos os tenants.
// O UPDATE é idempotente, então rodar em vários processos ao mesmo tempo não causa dano.

use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::services::circulation_service::CirculationService;

pub fn spawn(service: CirculationService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("⏰ Reconciliação de atrasos a cada {:?}", every);

        loop {
            ticker.tick().await;

            match service.reconcile_all().await {
                Ok(0) => {}
                Ok(updated) => {
                    tracing::info!("{} empréstimo(s) marcados como atrasados", updated)
                }
                // Falha temporária (banco fora do ar): tenta de novo no próximo tick
                Err(e) => tracing::warn!("⚠️ Falha na reconciliação de atrasos: {}", e),
            }
        }
    })
}

//! Coordinator Module Tests
//!
//! Exercises the work-unit state machine, FIFO assignment, concurrent
//! request handling, progress/completion accounting and the liveness sweep.

#[cfg(test)]
mod tests {
    use crate::coordinator::master::{CoordinatorConfig, WorkCoordinator};
    use crate::coordinator::types::{WorkStatus, WorkUnit, WorkerState};
    use crate::storage::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn coordinator_with_units(count: usize) -> Arc<WorkCoordinator> {
        let units: Vec<WorkUnit> = (0..count)
            .map(|i| WorkUnit::new("de", "dump", (i as u64) * 100, (i as u64 + 1) * 100))
            .collect();
        WorkCoordinator::new(units, Arc::new(MemoryStore::new()), CoordinatorConfig::default())
    }

    // ============================================================
    // Registration
    // ============================================================

    #[test]
    fn test_register_worker_is_idempotent() {
        let coordinator = coordinator_with_units(1);

        coordinator.register_worker("w1", "127.0.0.1:7001");
        coordinator.register_worker("w1", "127.0.0.1:7002");

        let status = coordinator.status_snapshot();
        assert_eq!(status.overview.workers_total, 1);
        assert_eq!(status.workers[0].address, "127.0.0.1:7002");
    }

    #[test]
    fn test_request_work_requires_registration() {
        let coordinator = coordinator_with_units(1);
        assert!(coordinator.request_work("ghost").is_err());
    }

    // ============================================================
    // Assignment
    // ============================================================

    #[test]
    fn test_request_work_is_fifo() {
        let coordinator = coordinator_with_units(3);
        coordinator.register_worker("w1", "a");

        let first = coordinator.request_work("w1").unwrap().unwrap();
        let second = coordinator.request_work("w1").unwrap().unwrap();

        assert_eq!(first.range_start, 0);
        assert_eq!(second.range_start, 100);
        assert_eq!(first.status, WorkStatus::Assigned);
        assert_eq!(first.assigned_worker.as_deref(), Some("w1"));
        assert!(first.assigned_at.is_some());
    }

    #[test]
    fn test_request_work_returns_none_on_empty_queue() {
        let coordinator = coordinator_with_units(1);
        coordinator.register_worker("w1", "a");

        assert!(coordinator.request_work("w1").unwrap().is_some());
        assert!(coordinator.request_work("w1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_double_assignment_under_concurrency() {
        // N concurrent requests, M < N pending units: exactly M get a unit,
        // each a different one.
        let coordinator = coordinator_with_units(5);
        for i in 0..20 {
            coordinator.register_worker(&format!("w{}", i), "a");
        }

        let mut handles = Vec::new();
        for i in 0..20 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator.request_work(&format!("w{}", i)).unwrap()
            }));
        }

        let mut assigned_ids = Vec::new();
        let mut none_count = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Some(unit) => assigned_ids.push(unit.id),
                None => none_count += 1,
            }
        }

        assert_eq!(assigned_ids.len(), 5);
        assert_eq!(none_count, 15);
        let unique: std::collections::HashSet<_> = assigned_ids.iter().collect();
        assert_eq!(unique.len(), 5, "a unit was double-assigned");
    }

    #[test]
    fn test_two_workers_one_unit() {
        let coordinator = coordinator_with_units(1);
        coordinator.register_worker("w1", "a");
        coordinator.register_worker("w2", "b");

        let first = coordinator.request_work("w1").unwrap();
        let second = coordinator.request_work("w2").unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    // ============================================================
    // Progress
    // ============================================================

    #[test]
    fn test_progress_transitions_to_processing() {
        let coordinator = coordinator_with_units(1);
        coordinator.register_worker("w1", "a");
        let unit = coordinator.request_work("w1").unwrap().unwrap();

        coordinator
            .report_progress("w1", &unit.id, 40, 12.5)
            .unwrap();

        let status = coordinator.status_snapshot();
        assert_eq!(status.overview.processing, 1);
        assert_eq!(status.units[0].entries_processed, 40);
        assert_eq!(status.units[0].processing_rate, 12.5);
    }

    #[test]
    fn test_progress_validation_errors() {
        let coordinator = coordinator_with_units(2);
        coordinator.register_worker("w1", "a");
        coordinator.register_worker("w2", "b");
        let unit = coordinator.request_work("w1").unwrap().unwrap();

        // Unknown unit.
        let bogus = crate::coordinator::types::WorkId::new();
        assert!(coordinator.report_progress("w1", &bogus, 1, 1.0).is_err());

        // Wrong worker.
        assert!(coordinator.report_progress("w2", &unit.id, 1, 1.0).is_err());

        // Unit not yet assigned.
        let idle = coordinator.status_snapshot();
        let pending_id = idle
            .units
            .iter()
            .find(|u| u.status == WorkStatus::Pending)
            .map(|u| u.id.clone())
            .unwrap();
        assert!(coordinator.report_progress("w1", &pending_id, 1, 1.0).is_err());
    }

    // ============================================================
    // Completion and the global total
    // ============================================================

    #[test]
    fn test_complete_moves_total_only_on_success() {
        let coordinator = coordinator_with_units(2);
        coordinator.register_worker("w1", "a");

        let first = coordinator.request_work("w1").unwrap().unwrap();
        coordinator
            .complete_work("w1", &first.id, true, 100, vec![])
            .unwrap();
        assert_eq!(coordinator.total_processed_entries(), 100);

        let second = coordinator.request_work("w1").unwrap().unwrap();
        coordinator
            .complete_work("w1", &second.id, false, 30, vec!["boom".to_string()])
            .unwrap();
        // Failed units contribute nothing.
        assert_eq!(coordinator.total_processed_entries(), 100);

        let status = coordinator.status_snapshot();
        assert_eq!(status.overview.completed, 1);
        assert_eq!(status.overview.failed, 1);
        assert_eq!(status.workers[0].state, WorkerState::Idle);
        assert_eq!(status.workers[0].total_processed, 100);
    }

    #[test]
    fn test_total_processed_is_monotonic() {
        let coordinator = coordinator_with_units(3);
        coordinator.register_worker("w1", "a");

        let mut last = 0;
        for expected in [10u64, 20, 30] {
            let unit = coordinator.request_work("w1").unwrap().unwrap();
            coordinator
                .report_progress("w1", &unit.id, expected / 2, 1.0)
                .unwrap();
            // Progress alone never moves the completed total.
            assert_eq!(coordinator.total_processed_entries(), last);

            coordinator
                .complete_work("w1", &unit.id, true, expected, vec![])
                .unwrap();
            let now = coordinator.total_processed_entries();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 60);
    }

    #[test]
    fn test_complete_is_terminal() {
        let coordinator = coordinator_with_units(1);
        coordinator.register_worker("w1", "a");
        let unit = coordinator.request_work("w1").unwrap().unwrap();

        coordinator
            .complete_work("w1", &unit.id, true, 10, vec![])
            .unwrap();

        // No re-completion, no late progress.
        assert!(coordinator.complete_work("w1", &unit.id, true, 10, vec![]).is_err());
        assert!(coordinator.report_progress("w1", &unit.id, 11, 1.0).is_err());
    }

    // ============================================================
    // Status aggregation
    // ============================================================

    #[test]
    fn test_status_snapshot_has_no_side_effects() {
        let coordinator = coordinator_with_units(2);
        coordinator.register_worker("w1", "a");
        coordinator.request_work("w1").unwrap().unwrap();

        let first = coordinator.status_snapshot();
        let second = coordinator.status_snapshot();

        assert_eq!(first.overview.pending, second.overview.pending);
        assert_eq!(first.overview.assigned, second.overview.assigned);
        assert_eq!(
            first.overview.total_processed_entries,
            second.overview.total_processed_entries
        );
    }

    #[test]
    fn test_progress_percent_reflects_completion() {
        let coordinator = coordinator_with_units(2); // 200 estimated entries
        coordinator.register_worker("w1", "a");

        let unit = coordinator.request_work("w1").unwrap().unwrap();
        coordinator
            .complete_work("w1", &unit.id, true, 100, vec![])
            .unwrap();

        let status = coordinator.status_snapshot();
        assert!((status.progress_percent - 50.0).abs() < f64::EPSILON);
    }

    // ============================================================
    // Liveness sweep
    // ============================================================

    fn stale_config(requeue: bool) -> CoordinatorConfig {
        CoordinatorConfig {
            liveness_timeout: Duration::from_millis(0),
            sweep_interval: Duration::from_millis(10),
            requeue_stale: requeue,
        }
    }

    #[tokio::test]
    async fn test_sweep_flags_offline_without_requeue_by_default() {
        let units = vec![WorkUnit::new("de", "dump", 0, 100)];
        let coordinator =
            WorkCoordinator::new(units, Arc::new(MemoryStore::new()), stale_config(false));

        coordinator.register_worker("w1", "a");
        coordinator.request_work("w1").unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let requeued = coordinator.sweep_stale();

        assert_eq!(requeued, 0);
        let status = coordinator.status_snapshot();
        assert_eq!(status.workers[0].state, WorkerState::Offline);
        // Historical behavior: the unit stays assigned to the dead worker.
        assert_eq!(status.overview.assigned, 1);
        assert_eq!(status.overview.pending, 0);
    }

    #[tokio::test]
    async fn test_sweep_requeues_units_when_enabled() {
        let units = vec![WorkUnit::new("de", "dump", 0, 100)];
        let coordinator =
            WorkCoordinator::new(units, Arc::new(MemoryStore::new()), stale_config(true));

        coordinator.register_worker("w1", "a");
        let unit = coordinator.request_work("w1").unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let requeued = coordinator.sweep_stale();
        assert_eq!(requeued, 1);

        // A late worker can pick the unit up again.
        coordinator.register_worker("w2", "b");
        let reassigned = coordinator.request_work("w2").unwrap().unwrap();
        assert_eq!(reassigned.id, unit.id);
        assert_eq!(reassigned.assigned_worker.as_deref(), Some("w2"));
    }

    // ============================================================
    // Persistence / resume
    // ============================================================

    #[test]
    fn test_resume_reloads_queue_state() {
        let store = Arc::new(MemoryStore::new());
        let units = vec![
            WorkUnit::new("de", "dump", 0, 100),
            WorkUnit::new("de", "dump", 100, 200),
        ];
        let coordinator =
            WorkCoordinator::new(units, store.clone(), CoordinatorConfig::default());

        coordinator.register_worker("w1", "a");
        let unit = coordinator.request_work("w1").unwrap().unwrap();
        coordinator
            .complete_work("w1", &unit.id, true, 100, vec![])
            .unwrap();
        drop(coordinator);

        let resumed = WorkCoordinator::resume(store, CoordinatorConfig::default());
        assert_eq!(resumed.total_processed_entries(), 100);

        let status = resumed.status_snapshot();
        assert_eq!(status.overview.total_units, 2);
        assert_eq!(status.overview.completed, 1);
        assert_eq!(status.overview.pending, 1);
    }

    #[test]
    fn test_plan_units_covers_span() {
        let units = WorkUnit::plan_units("de", "dump", 250, 100);
        assert_eq!(units.len(), 3);
        assert_eq!((units[0].range_start, units[0].range_end), (0, 100));
        assert_eq!((units[2].range_start, units[2].range_end), (200, 250));
        assert_eq!(units[2].estimated_size, 50);
        assert!(units.iter().all(|u| u.status == WorkStatus::Pending));
    }
}

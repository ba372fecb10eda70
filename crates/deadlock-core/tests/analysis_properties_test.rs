//! Integration test: safety, detection and recovery properties.
//!
//! Run: cargo test -p deadlock-core --test analysis_properties_test

use deadlock_core::{
    Node, RecoveryOutcome, SystemState, ToolkitError, Units, check_safety, detect, recover,
};

fn textbook(available: &[Units]) -> SystemState {
    let mut state = SystemState::new(5, 3).unwrap();
    state
        .set_initial_state(
            &[
                vec![0, 1, 0],
                vec![2, 0, 0],
                vec![3, 0, 2],
                vec![2, 1, 1],
                vec![0, 0, 2],
            ],
            &[
                vec![7, 5, 3],
                vec![3, 2, 2],
                vec![9, 0, 2],
                vec![2, 2, 2],
                vec![4, 3, 3],
            ],
            available,
        )
        .unwrap();
    state
}

fn two_process_deadlock() -> SystemState {
    let mut state = SystemState::new(2, 2).unwrap();
    state
        .set_initial_state(&[vec![1, 0], vec![0, 1]], &[vec![1, 1], vec![1, 1]], &[0, 0])
        .unwrap();
    state.set_request(0, &[0, 1]).unwrap();
    state.set_request(1, &[1, 0]).unwrap();
    state
}

/// Small deterministic generator so the sweep below is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u32) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) % u64::from(bound)) as u32
    }
}

fn random_state(rng: &mut Lcg) -> SystemState {
    let p = 1 + rng.next(6) as usize;
    let r = 1 + rng.next(4) as usize;
    let mut allocation = Vec::new();
    let mut max_demand = Vec::new();
    for _ in 0..p {
        let alloc: Vec<Units> = (0..r).map(|_| rng.next(4)).collect();
        let max: Vec<Units> = alloc.iter().map(|&a| a + rng.next(5)).collect();
        allocation.push(alloc);
        max_demand.push(max);
    }
    let available: Vec<Units> = (0..r).map(|_| rng.next(6)).collect();
    let mut state = SystemState::new(p, r).unwrap();
    state
        .set_initial_state(&allocation, &max_demand, &available)
        .unwrap();
    for process in 0..p {
        let request: Vec<Units> = (0..r).map(|_| rng.next(2)).collect();
        state.set_request(process, &request).unwrap();
    }
    state
}

#[test]
fn textbook_fixture_safe_sequence() {
    let report = check_safety(&textbook(&[3, 3, 2]));
    assert!(report.is_safe);
    assert_eq!(report.safe_sequence, vec![1, 3, 4, 0, 2]);
}

#[test]
fn textbook_fixture_unsafe_without_units() {
    let report = check_safety(&textbook(&[0, 0, 0]));
    assert!(!report.is_safe);
    assert_eq!(report.unfinished.len(), 5);
}

#[test]
fn safe_sequences_replay_without_deficit() {
    let mut rng = Lcg(0x5eed);
    let mut safe_seen = 0;
    for _ in 0..200 {
        let state = random_state(&mut rng);
        let report = check_safety(&state);

        let mut order = report.safe_sequence.clone();
        order.extend(&report.unfinished);
        order.sort_unstable();
        assert_eq!(order, (0..state.num_processes()).collect::<Vec<_>>());

        let need = state.need();
        let mut work: Vec<i64> = state.available().iter().map(|&v| i64::from(v)).collect();
        for &p in &report.safe_sequence {
            for (r, w) in work.iter_mut().enumerate() {
                assert!(*w - need[p][r] >= 0, "replay went negative at P{p}");
                *w += i64::from(state.allocation().get(p, r));
            }
        }
        if report.is_safe {
            safe_seen += 1;
            assert!(report.unfinished.is_empty());
        }
    }
    assert!(safe_seen > 0);
}

#[test]
fn cycle_fixture() {
    let report = detect(&two_process_deadlock());
    assert!(report.has_deadlock);
    assert_eq!(
        report.cycles,
        vec![vec![
            Node::Process(0),
            Node::Resource(1),
            Node::Process(1),
            Node::Resource(0),
        ]]
    );
}

#[test]
fn acyclic_fixture() {
    let mut state = two_process_deadlock();
    state.set_request(1, &[0, 0]).unwrap();
    let report = detect(&state);
    assert!(!report.has_deadlock);
    assert!(report.cycles.is_empty());
}

#[test]
fn recovery_is_a_no_op_without_deadlock() {
    let mut state = textbook(&[3, 3, 2]);
    let before = state.clone();
    assert_eq!(recover(&mut state), RecoveryOutcome::NoDeadlock);
    assert_eq!(state, before);
}

#[test]
fn recovery_conserves_units_across_sweep() {
    let mut rng = Lcg(42);
    let mut recovered = 0;
    for _ in 0..200 {
        let mut state = random_state(&mut rng);
        let before = state.clone();
        match recover(&mut state) {
            RecoveryOutcome::NoDeadlock => assert_eq!(state, before),
            RecoveryOutcome::Recovered(action) => {
                recovered += 1;
                let v = action.victim;
                assert_eq!(action.released, before.allocation().row(v));
                assert!(state.allocation().row(v).iter().all(|&u| u == 0));
                for r in 0..state.num_resources() {
                    assert_eq!(
                        state.available()[r],
                        before.available()[r] + before.allocation().get(v, r)
                    );
                }
                assert_eq!(state.total_units(), before.total_units());
                assert_eq!(state.request(), before.request());
            }
        }
    }
    assert!(recovered > 0);
}

#[test]
fn dimension_mismatch_is_all_or_nothing() {
    let mut state = textbook(&[3, 3, 2]);
    state.set_request(2, &[1, 0, 0]).unwrap();
    let before = state.clone();
    let err = state
        .set_initial_state(
            &[
                vec![0, 1, 0],
                vec![2, 0],
                vec![3, 0, 2],
                vec![2, 1, 1],
                vec![0, 0, 2],
            ],
            &vec![vec![9, 9, 9]; 5],
            &[1, 1, 1],
        )
        .unwrap_err();
    assert_eq!(
        err,
        ToolkitError::DimensionMismatch {
            what: "allocation row 1".to_string(),
            expected: 3,
            found: 2,
        }
    );
    assert_eq!(state, before);
}

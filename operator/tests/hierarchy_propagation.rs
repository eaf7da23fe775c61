mod fixtures;

use fixtures::{Harness, head, key};
use operator::cluster::Kind;
use operator::controller::Outcome;

/// Drives the hierarchy from a bare Head until the Deployment exists.
async fn converge_tree(h: &Harness) {
    h.cluster.insert_head(head("nginx:1.27"));
    assert_eq!(h.head.reconcile(&key()).await.unwrap(), Outcome::Created);
    assert_eq!(h.childa.reconcile(&key()).await.unwrap(), Outcome::Created);
}

#[tokio::test]
async fn head_image_flows_down_to_deployment() {
    let h = Harness::new();
    converge_tree(&h).await;

    let deployment = h.cluster.deployment(&key()).unwrap();
    let pod = deployment.spec.unwrap().template.spec.unwrap();
    assert_eq!(pod.containers.len(), 1);
    assert_eq!(pod.containers[0].name, "main");
    assert_eq!(pod.containers[0].image.as_deref(), Some("nginx:1.27"));
}

#[tokio::test]
async fn readiness_needs_two_passes_to_reach_head() {
    let h = Harness::new();
    converge_tree(&h).await;
    h.cluster.set_deployment_replicas(&key(), 3, 3);

    assert_eq!(
        h.childa.reconcile(&key()).await.unwrap(),
        Outcome::StatusUpdated { ready: true }
    );
    assert!(h.cluster.childa(&key()).unwrap().is_ready());
    assert!(!h.cluster.head(&key()).unwrap().is_ready());

    assert_eq!(
        h.head.reconcile(&key()).await.unwrap(),
        Outcome::StatusUpdated { ready: true }
    );
    assert!(h.cluster.head(&key()).unwrap().is_ready());
}

#[tokio::test]
async fn readiness_loss_also_climbs_one_level_per_pass() {
    let h = Harness::new();
    converge_tree(&h).await;
    h.cluster.set_deployment_replicas(&key(), 3, 3);
    h.childa.reconcile(&key()).await.unwrap();
    h.head.reconcile(&key()).await.unwrap();

    h.cluster.set_deployment_replicas(&key(), 3, 1);

    // Head loop first: nothing has changed at its level yet.
    assert_eq!(h.head.reconcile(&key()).await.unwrap(), Outcome::Converged);
    assert!(h.cluster.head(&key()).unwrap().is_ready());

    h.childa.reconcile(&key()).await.unwrap();
    assert!(!h.cluster.childa(&key()).unwrap().is_ready());
    assert!(h.cluster.head(&key()).unwrap().is_ready());

    h.head.reconcile(&key()).await.unwrap();
    assert!(!h.cluster.head(&key()).unwrap().is_ready());
}

#[tokio::test]
async fn converged_tree_is_quiet() {
    let h = Harness::new();
    converge_tree(&h).await;
    h.cluster.set_deployment_replicas(&key(), 1, 1);
    h.childa.reconcile(&key()).await.unwrap();
    h.head.reconcile(&key()).await.unwrap();
    let settled = h.cluster.mutation_count();

    for _ in 0..3 {
        assert_eq!(h.childa.reconcile(&key()).await.unwrap(), Outcome::Converged);
        assert_eq!(h.head.reconcile(&key()).await.unwrap(), Outcome::Converged);
    }
    assert_eq!(h.cluster.mutation_count(), settled);
}

#[tokio::test]
async fn childa_gone_after_head_deletion_is_a_noop() {
    let h = Harness::new();
    converge_tree(&h).await;
    let before = h.cluster.mutation_count();

    // Garbage collection removed the ChildA while its event was queued.
    h.cluster.remove(Kind::ChildA, &key());

    assert_eq!(h.childa.reconcile(&key()).await.unwrap(), Outcome::NotFound);
    assert_eq!(h.cluster.mutation_count(), before);
}

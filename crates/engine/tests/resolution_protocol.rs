//! End-to-end protocol behavior through the public entry points, driven by
//! scripted in-memory creators.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use engine::{create_execution_plan, create_filters, Advertisements, CreatorClients, EngineConfig};
use resolution::{
    CreatorAdvertisement, CreatorClient, CreatorError, CreatorName, CreatorRequest,
    CreatorResponse, Fragments, NodeId, NodeTypeName, PlanNode, ResolutionError,
};
use serde_json::{json, Value};

const RAW_PIPELINE: &str = r#"{
    "pipeline": {
        "name": "build-and-deploy",
        "stages": [
            {"stage": {"type": "CI", "name": "build"}},
            {"stage": {"type": "CD", "name": "deploy"}}
        ]
    }
}"#;

type ResolveFn =
    Box<dyn Fn(&CreatorRequest) -> Result<CreatorResponse, CreatorError> + Send + Sync>;

/// A creator whose behavior is a plain closure over the incoming request.
struct ScriptedCreator {
    behavior: ResolveFn,
    calls: AtomicU32,
}

impl ScriptedCreator {
    fn new(
        behavior: impl Fn(&CreatorRequest) -> Result<CreatorResponse, CreatorError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            behavior: Box::new(behavior),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreatorClient for ScriptedCreator {
    async fn resolve(&self, request: CreatorRequest) -> Result<CreatorResponse, CreatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.behavior)(&request)
    }
}

fn creator(name: &str) -> CreatorName {
    CreatorName::new(name).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn federation(
    creators: Vec<(CreatorName, Arc<ScriptedCreator>)>,
) -> (Advertisements, CreatorClients) {
    let advertisements: Advertisements = creators
        .iter()
        .map(|(name, _)| (name.clone(), CreatorAdvertisement::default()))
        .collect();
    let clients: CreatorClients = creators
        .into_iter()
        .map(|(name, client)| (name, client as Arc<dyn CreatorClient>))
        .collect();
    (advertisements, clients)
}

fn plan_node(node_id: &NodeId, name: &str, starting: bool) -> PlanNode {
    PlanNode {
        node_id: node_id.clone(),
        name: name.into(),
        node_type: NodeTypeName::new("Stage").unwrap(),
        starting,
        content: json!({}),
    }
}

/// Resolves every fragment it is sent and marks the first one as starting.
fn resolve_everything(request: &CreatorRequest) -> Result<CreatorResponse, CreatorError> {
    let mut response = CreatorResponse::default();
    let mut nodes = Vec::new();
    for (index, (node_id, content)) in request.dependencies.iter().enumerate() {
        response.resolved.insert(node_id.clone(), content.clone());
        nodes.push(plan_node(node_id, "resolved", index == 0));
    }
    response.fragments = Fragments::Plan(nodes);
    Ok(response)
}

#[tokio::test]
async fn single_creator_single_node_produces_a_plan() {
    init_tracing();
    let root_resolver = ScriptedCreator::new(resolve_everything);
    let (advertisements, clients) = federation(vec![(creator("ci"), root_resolver.clone())]);

    let plan = create_execution_plan(RAW_PIPELINE, &advertisements, &clients, &EngineConfig::default())
        .await
        .unwrap();

    assert_eq!(plan.nodes.len(), 1);
    assert_eq!(plan.starting_node_id, plan.nodes[0].node_id);
    assert_eq!(root_resolver.calls(), 1);
}

#[tokio::test]
async fn recursive_discovery_converges_in_two_iterations() {
    // Creator X resolves the root and reveals two children; creator Y
    // resolves anything whose content is a stage.
    let child_content = |name: &str| json!({"type": "Stage", "name": name});
    let x = ScriptedCreator::new(move |request| {
        let mut response = CreatorResponse::default();
        for (node_id, content) in request.dependencies.iter() {
            if content.get("name") == Some(&Value::String("build-and-deploy".into())) {
                response.resolved.insert(node_id.clone(), content.clone());
                response.fragments = Fragments::Plan(vec![plan_node(node_id, "pipeline", true)]);
                response
                    .still_unresolved
                    .insert(NodeId::new("child-build").unwrap(), child_content("build"));
                response
                    .still_unresolved
                    .insert(NodeId::new("child-deploy").unwrap(), child_content("deploy"));
            }
        }
        Ok(response)
    });
    let y = ScriptedCreator::new(|request| {
        let mut response = CreatorResponse::default();
        let mut nodes = Vec::new();
        for (node_id, content) in request.dependencies.iter() {
            if content.get("type") == Some(&Value::String("Stage".into())) {
                response.resolved.insert(node_id.clone(), content.clone());
                nodes.push(plan_node(node_id, "stage", false));
            }
        }
        response.fragments = Fragments::Plan(nodes);
        Ok(response)
    });

    let (advertisements, clients) =
        federation(vec![(creator("x"), x.clone()), (creator("y"), y.clone())]);

    let plan = create_execution_plan(RAW_PIPELINE, &advertisements, &clients, &EngineConfig::default())
        .await
        .unwrap();

    assert_eq!(plan.nodes.len(), 3);
    assert_eq!(x.calls(), 2);
    assert_eq!(y.calls(), 2);
}

#[tokio::test]
async fn exhaustion_names_the_unresolved_root_and_is_bounded() {
    let stubborn = ScriptedCreator::new(|request| {
        Ok(CreatorResponse {
            still_unresolved: request
                .dependencies
                .iter()
                .map(|(id, content)| (id.clone(), content.clone()))
                .collect(),
            ..Default::default()
        })
    });
    let (advertisements, clients) = federation(vec![(creator("ci"), stubborn.clone())]);
    let config = EngineConfig {
        plan_max_depth: 3,
        ..Default::default()
    };

    let err = create_execution_plan(RAW_PIPELINE, &advertisements, &clients, &config)
        .await
        .unwrap_err();

    match err {
        ResolutionError::UnresolvedDependencies { node_ids } => assert_eq!(node_ids.len(), 1),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stubborn.calls(), 3);
}

#[tokio::test]
async fn malformed_document_makes_zero_creator_calls() {
    let counting = ScriptedCreator::new(resolve_everything);
    let (advertisements, clients) = federation(vec![(creator("ci"), counting.clone())]);

    let err = create_execution_plan("42", &advertisements, &clients, &EngineConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ResolutionError::MalformedDocument { .. }));
    assert_eq!(counting.calls(), 0);
}

#[tokio::test]
async fn empty_registry_short_circuits_to_unresolved_dependencies() {
    let err = create_execution_plan(
        RAW_PIPELINE,
        &Advertisements::new(),
        &CreatorClients::new(),
        &EngineConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ResolutionError::UnresolvedDependencies { .. }));
}

#[tokio::test]
async fn plan_resolution_aborts_on_a_single_creator_failure() {
    let healthy = ScriptedCreator::new(resolve_everything);
    let broken = ScriptedCreator::new(|_| {
        Err(CreatorError::Transport {
            reason: "connection refused".into(),
        })
    });
    let (advertisements, clients) =
        federation(vec![(creator("ci"), healthy), (creator("cd"), broken)]);

    let err = create_execution_plan(RAW_PIPELINE, &advertisements, &clients, &EngineConfig::default())
        .await
        .unwrap_err();

    match err {
        ResolutionError::UnexpectedResolutionFailure { creator: failed, .. } => {
            assert_eq!(failed, creator("cd"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn filter_resolution_survives_a_failing_creator() {
    init_tracing();
    let healthy = ScriptedCreator::new(|request: &CreatorRequest| {
        Ok(CreatorResponse {
            resolved: request
                .dependencies
                .iter()
                .map(|(id, content)| (id.clone(), content.clone()))
                .collect(),
            fragments: Fragments::Filter("stage:ci".into()),
            ..Default::default()
        })
    });
    let broken = ScriptedCreator::new(|_| {
        Err(CreatorError::Service {
            message: "internal error".into(),
        })
    });
    let (advertisements, clients) =
        federation(vec![(creator("ci"), healthy), (creator("cd"), broken)]);

    let filters = create_filters(RAW_PIPELINE, &advertisements, &clients, &EngineConfig::default())
        .await
        .unwrap();

    assert_eq!(filters.len(), 1);
    assert_eq!(filters.get(&creator("ci")).map(String::as_str), Some("stage:ci"));
}

#[tokio::test]
async fn conflicting_resolution_claims_abort_the_request() {
    let first = ScriptedCreator::new(resolve_everything);
    let second = ScriptedCreator::new(resolve_everything);
    let (advertisements, clients) =
        federation(vec![(creator("ci"), first), (creator("cd"), second)]);

    let err = create_execution_plan(RAW_PIPELINE, &advertisements, &clients, &EngineConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ResolutionError::ConflictingResolution { .. }));
}

#[tokio::test]
async fn converged_plan_without_starting_node_is_rejected() {
    // Resolves everything but never marks a starting node.
    let no_start = ScriptedCreator::new(|request: &CreatorRequest| {
        let mut response = CreatorResponse::default();
        let mut nodes = Vec::new();
        for (node_id, content) in request.dependencies.iter() {
            response.resolved.insert(node_id.clone(), content.clone());
            nodes.push(plan_node(node_id, "resolved", false));
        }
        response.fragments = Fragments::Plan(nodes);
        Ok(response)
    });
    let (advertisements, clients) = federation(vec![(creator("ci"), no_start)]);

    let err = create_execution_plan(RAW_PIPELINE, &advertisements, &clients, &EngineConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ResolutionError::NoStartingNode));
}

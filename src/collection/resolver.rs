use crate::collection::cache::{CollectionChoice, MetadataCache, TRIGGERS_SLOT};
use crate::collection::meta::{MetaGlobal, MetaGlobals, WorkstepSummary};
use crate::collection::types::Collection;
use crate::collection::walker::{Entry, scenario_folders, walk};
use crate::config::CollectionPaths;
use crate::error::{Result, ScenarioError};
use crate::faker::{GeneratorRegistry, locale_codes};
use crate::params::{
    WORKSTEP_ENDPOINT, WORKSTEP_FAKER, WORKSTEP_ID, WORKSTEP_SERVICE, WorkstepParams,
};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// 主集合、工作集合及各自的 schema 集合
#[derive(Debug, Clone, Default)]
pub struct CollectionSet {
    pub primary: Collection,
    pub primary_schemas: Collection,
    pub working: Collection,
    pub working_schemas: Collection,
}

impl CollectionSet {
    /// 从配置的路径加载；文件缺失时为空集合
    pub fn load(paths: &CollectionPaths) -> Self {
        Self {
            primary: load_collection(&paths.primary),
            primary_schemas: load_collection(&paths.primary_schemas),
            working: load_collection(&paths.working),
            working_schemas: load_collection(&paths.working_schemas),
        }
    }

    pub fn pick(&self, choice: CollectionChoice) -> (&Collection, &Collection) {
        match choice {
            CollectionChoice::Primary => (&self.primary, &self.primary_schemas),
            CollectionChoice::Working => (&self.working, &self.working_schemas),
        }
    }
}

fn load_collection(path: &Path) -> Collection {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Collection {} not loaded: {}", path.display(), e);
            return Collection::empty();
        }
    };

    match Collection::from_json(&content) {
        Ok(collection) => {
            tracing::debug!("Loaded collection {}", path.display());
            collection
        }
        Err(e) => {
            tracing::warn!("Collection {} is not valid JSON: {}", path.display(), e);
            Collection::empty()
        }
    }
}

/// 工作步骤元数据解析器
pub struct MetadataResolver {
    paths: CollectionPaths,
    collections: RwLock<Arc<CollectionSet>>,
    cache: Arc<MetadataCache>,
}

impl MetadataResolver {
    pub fn new(paths: CollectionPaths, cache: Arc<MetadataCache>) -> Self {
        let collections = CollectionSet::load(&paths);
        Self::with_collections(paths, collections, cache)
    }

    pub fn with_collections(
        paths: CollectionPaths,
        collections: CollectionSet,
        cache: Arc<MetadataCache>,
    ) -> Self {
        Self {
            paths,
            collections: RwLock::new(Arc::new(collections)),
            cache,
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    fn collections(&self) -> Arc<CollectionSet> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 重新读取集合文件并清空缓存
    pub fn reload(&self) {
        let collections = CollectionSet::load(&self.paths);
        *self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(collections);
        self.cache.invalidate();
    }

    /// 已缓存的元数据，不触发解析
    pub fn cached(&self, params: &WorkstepParams) -> MetaGlobals {
        self.cache
            .get(params.get(WORKSTEP_ENDPOINT).unwrap_or(TRIGGERS_SLOT))
    }

    /// 解析元数据并写入缓存
    ///
    /// 四个工作步骤参数齐全时生成工作步骤元数据（按 endpoint 缓存），
    /// 否则生成场景目录列表（缓存在 `triggers` 槽位）。
    pub fn resolve(&self, session_id: Option<&str>, params: &WorkstepParams) -> Result<MetaGlobals> {
        let collections = self.collections();
        let (choice, is_new) = self.cache.select_with(|| match session_id {
            Some(id) if !id.is_empty() && collections.primary.contains_id(id) => {
                CollectionChoice::Primary
            }
            _ => CollectionChoice::Working,
        });
        if is_new {
            tracing::info!("Sourcing {} collection", choice.label());
        }

        let (collection, schemas) = collections.pick(choice);

        if !params.is_workstep_call() {
            let globals = trigger_globals(collection);
            self.cache.store(TRIGGERS_SLOT, globals.clone());
            return Ok(globals);
        }

        let mut globals = workstep_globals(collection, schemas, params)?;
        if params.get_non_empty(WORKSTEP_FAKER).is_some() {
            globals.extend(faker_globals());
        }

        let endpoint = params.get(WORKSTEP_ENDPOINT).unwrap_or_default();
        self.cache.store(endpoint, globals.clone());
        Ok(globals)
    }

    /// 场景目录名 -> 目录 id，先查缓存，未命中时解析
    pub fn scenario_folder_id(&self, session_id: Option<&str>, folder: &str) -> Result<Option<String>> {
        let lookup = |globals: &MetaGlobals| {
            globals
                .get(folder)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        if let Some(id) = lookup(&self.cache.get(TRIGGERS_SLOT)) {
            return Ok(Some(id));
        }

        let globals = self.resolve(session_id, &WorkstepParams::new())?;
        Ok(lookup(&globals))
    }
}

fn trigger_globals(collection: &Collection) -> MetaGlobals {
    let Some(root) = &collection.root else {
        return MetaGlobals::new();
    };

    scenario_folders(&walk(root))
        .into_iter()
        .map(|(folder, folder_id)| MetaGlobal::new(folder, folder_id))
        .collect()
}

fn workstep_globals(
    collection: &Collection,
    schemas: &Collection,
    params: &WorkstepParams,
) -> Result<MetaGlobals> {
    let workstep_id = params.get(WORKSTEP_ID).unwrap_or_default();
    let endpoint = params.get(WORKSTEP_ENDPOINT).unwrap_or_default();
    let service = params.get(WORKSTEP_SERVICE).unwrap_or_default();

    let entries = collection.root.as_ref().map(walk).unwrap_or_default();

    let mut worksteps = Vec::new();
    let mut responses = Vec::new();
    for entry in &entries {
        let Entry::Workstep { folder, node, .. } = entry else {
            continue;
        };

        worksteps.push(WorkstepSummary {
            folder: folder.clone(),
            request_name: node.name.clone(),
            request_id: node.id.clone(),
        });

        if !node.id.ends_with(workstep_id) {
            continue;
        }
        if let Some(object_mock) = &node.object_mock {
            responses.push(MetaGlobal::new("objectMock", object_mock.as_str()));
        }
        for example in &node.examples {
            responses.push(MetaGlobal::new(
                format!("{}/request/{}/{}", endpoint, example.name, service),
                example.body.as_str(),
            ));
        }
    }

    let current: Vec<&WorkstepSummary> = worksteps
        .iter()
        .filter(|step| step.request_id == workstep_id)
        .collect();
    let [current] = current.as_slice() else {
        return Err(ScenarioError::NotFound(format!(
            "_workstep_id \"{}\" not found in local collection: trigger quickSync or syncCollections and retry",
            workstep_id
        )));
    };
    let folder = current.folder.clone();
    let siblings: Vec<&WorkstepSummary> = worksteps.iter().filter(|s| s.folder == folder).collect();

    let schema_key = format!("{}/{}", endpoint, service);
    let service_schemas = schemas
        .variable(&schema_key)
        .and_then(decode_schema)
        .ok_or_else(|| {
            ScenarioError::NotFound(format!("No service schema found for endpoint {}", schema_key))
        })?;

    let mut globals = MetaGlobals::new();
    globals.push(MetaGlobal::new("workstep_id", workstep_id));
    globals.push(MetaGlobal::new("worksteps", serde_json::to_value(siblings)?));
    globals.push(MetaGlobal::new("workstep_responses", serde_json::to_value(responses)?));
    globals.push(MetaGlobal::new("workstep_schemas", service_schemas));
    Ok(globals)
}

/// schema 变量通常是 JSON 字符串
fn decode_schema(value: &Value) -> Option<Value> {
    match value {
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .ok()
            .filter(Value::is_object),
        Value::Object(_) => Some(value.clone()),
        _ => None,
    }
}

/// 生成器目录及语言区域
fn faker_globals() -> Vec<MetaGlobal> {
    let registry = GeneratorRegistry::global();
    registry
        .catalogue()
        .map(|(key, value)| MetaGlobal::new(key, value))
        .chain(locale_codes().map(|code| MetaGlobal::new(format!("mock_locale_{}", code), code)))
        .collect()
}

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Postman 集合中工作步骤请求使用的未替换方法占位符
pub const WORKSTEP_METHOD: &str = "{{M}}";

/// Postman 集合文件（只反序列化用到的字段）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostmanCollection {
    #[serde(default)]
    pub item: Vec<PostmanItem>,
    #[serde(default)]
    pub variable: Vec<PostmanVariable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostmanItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub request: Option<PostmanRequest>,
    #[serde(default)]
    pub item: Vec<PostmanItem>,
    #[serde(default)]
    pub response: Vec<PostmanResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostmanRequest {
    pub method: Option<String>,
    pub url: Option<PostmanUrl>,
}

/// url 可以是字符串或结构化对象
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PostmanUrl {
    Structured {
        #[serde(default)]
        query: Vec<PostmanQuery>,
    },
    Raw(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostmanQuery {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostmanResponse {
    pub id: Option<String>,
    pub name: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostmanVariable {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// 集合树节点
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionNode {
    Folder {
        id: String,
        name: String,
        children: Vec<CollectionNode>,
    },
    Workstep(WorkstepNode),
    /// 普通请求，不参与工作步骤解析
    Request { id: String, name: String },
}

/// 方法为 `{{M}}` 的请求
#[derive(Debug, Clone, PartialEq)]
pub struct WorkstepNode {
    pub id: String,
    pub name: String,
    /// `_objectMock` 查询参数（已去掉花括号）
    pub object_mock: Option<String>,
    pub examples: Vec<ExampleResponse>,
}

/// 保存的示例响应
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleResponse {
    pub name: String,
    pub body: String,
}

impl From<&PostmanItem> for CollectionNode {
    fn from(item: &PostmanItem) -> Self {
        let id = item.id.clone().unwrap_or_default();
        let name = item.name.clone().unwrap_or_default();

        let Some(request) = &item.request else {
            return CollectionNode::Folder {
                id,
                name,
                children: item.item.iter().map(CollectionNode::from).collect(),
            };
        };

        if request.method.as_deref() != Some(WORKSTEP_METHOD) {
            return CollectionNode::Request { id, name };
        }

        let object_mock = match &request.url {
            Some(PostmanUrl::Structured { query }) => query
                .iter()
                .find(|q| q.key.as_deref() == Some("_objectMock"))
                .and_then(|q| q.value.as_deref())
                .map(|value| value.replace(['{', '}'], ""))
                .filter(|value| !value.is_empty()),
            _ => None,
        };

        let examples = item
            .response
            .iter()
            .map(|response| ExampleResponse {
                name: response.name.clone().unwrap_or_default(),
                body: response.body.clone().unwrap_or_default(),
            })
            .collect();

        CollectionNode::Workstep(WorkstepNode {
            id,
            name,
            object_mock,
            examples,
        })
    }
}

/// 加载后的集合快照
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// 第一个顶层条目（场景根目录）
    pub root: Option<CollectionNode>,
    pub variables: Vec<PostmanVariable>,
    ids: HashSet<String>,
}

impl Collection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let raw: PostmanCollection = serde_json::from_str(content)?;
        Ok(Self::from(raw))
    }

    /// 是否包含该 id（任意层级的目录、请求或示例响应）
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// 按 key 查找集合变量，必须唯一
    pub fn variable(&self, key: &str) -> Option<&Value> {
        let mut matches = self.variables.iter().filter(|v| v.key == key);
        match (matches.next(), matches.next()) {
            (Some(variable), None) => Some(&variable.value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.variables.is_empty()
    }
}

impl From<PostmanCollection> for Collection {
    fn from(raw: PostmanCollection) -> Self {
        fn collect_ids(items: &[PostmanItem], ids: &mut HashSet<String>) {
            for item in items {
                ids.extend(item.id.iter().cloned());
                ids.extend(item.response.iter().filter_map(|r| r.id.clone()));
                collect_ids(&item.item, ids);
            }
        }

        let mut ids = HashSet::new();
        collect_ids(&raw.item, &mut ids);

        Self {
            root: raw.item.first().map(CollectionNode::from),
            variables: raw.variable,
            ids,
        }
    }
}

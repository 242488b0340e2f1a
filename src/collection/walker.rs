use crate::collection::types::{CollectionNode, WorkstepNode};

/// 扁平化后的集合条目
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<'a> {
    Folder {
        /// `Root/Sub` 形式的路径
        folder: String,
        folder_id: String,
    },
    Workstep {
        folder: String,
        folder_id: String,
        node: &'a WorkstepNode,
    },
}

impl Entry<'_> {
    pub fn folder(&self) -> &str {
        match self {
            Entry::Folder { folder, .. } | Entry::Workstep { folder, .. } => folder,
        }
    }

    pub fn folder_id(&self) -> &str {
        match self {
            Entry::Folder { folder_id, .. } | Entry::Workstep { folder_id, .. } => folder_id,
        }
    }
}

/// 从场景根目录开始递归下降，输出工作步骤和子目录条目
///
/// 根目录本身不产生条目；普通请求被忽略。
pub fn walk(root: &CollectionNode) -> Vec<Entry<'_>> {
    let mut entries = Vec::new();
    visit(root, "", "", &mut entries);
    entries
}

fn visit<'a>(node: &'a CollectionNode, path: &str, parent_id: &str, out: &mut Vec<Entry<'a>>) {
    match node {
        CollectionNode::Folder { id, name, children } => {
            let current = if path.is_empty() {
                name.clone()
            } else {
                let current = format!("{}/{}", path, name);
                out.push(Entry::Folder {
                    folder: current.clone(),
                    folder_id: id.clone(),
                });
                current
            };

            for child in children {
                visit(child, &current, id, out);
            }
        }
        CollectionNode::Workstep(step) => out.push(Entry::Workstep {
            folder: path.to_string(),
            folder_id: parent_id.to_string(),
            node: step,
        }),
        CollectionNode::Request { .. } => {}
    }
}

/// 目录路径 -> 目录 id，第一次出现为准
pub fn scenario_folders(entries: &[Entry<'_>]) -> Vec<(String, String)> {
    let mut folders: Vec<(String, String)> = Vec::new();
    for entry in entries {
        if !folders.iter().any(|(folder, _)| folder == entry.folder()) {
            folders.push((entry.folder().to_string(), entry.folder_id().to_string()));
        }
    }
    folders
}

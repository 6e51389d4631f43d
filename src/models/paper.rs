use std::path::{Path, PathBuf};

/// 论文中的一个章节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub text: String,
}

impl Section {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// 从 PDF 中提取出的论文
///
/// 章节保持原文顺序，既可以按名称查找，也可以按位置查找。
#[derive(Debug, Clone)]
pub struct Paper {
    pub title: String,
    pub sections: Vec<Section>,
    pub path: PathBuf,
}

impl Paper {
    pub fn new(title: impl Into<String>, sections: Vec<Section>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            sections,
            path: path.into(),
        }
    }

    /// 按名称查找章节正文
    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.text.as_str())
    }

    /// 按位置查找章节（从 0 开始）
    pub fn section_at(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// 文件名，用于日志显示
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

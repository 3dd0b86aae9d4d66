use std::fmt;

use crate::host::{LayerRef, SavePolicy};

/// Сводка по одному сохраняемому слою.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub name: String,
    pub feature_count: usize,
}

impl fmt::Display for LayerInfo {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let noun = if self.feature_count == 1 {
            "feature"
        } else {
            "features"
        };
        write!(f, "- {} ({} {noun})", self.name, self.feature_count)
    }
}

/// Сводки по слоям, которые пройдут через архив.
pub fn layer_info(
    layers: &[LayerRef],
    policy: &dyn SavePolicy,
) -> Vec<LayerInfo> {
    layers
        .iter()
        .filter_map(|l| {
            let layer = l.borrow();
            policy.is_saved_layer(&*layer).then(|| LayerInfo {
                name: layer.name().to_string(),
                feature_count: layer.feature_count(),
            })
        })
        .collect()
}

/// Текст для пользователя.
pub fn info_message(info: &[LayerInfo]) -> String {
    if info.is_empty() {
        return "This project contains no memory layers to be saved".to_string();
    }
    let mut msg = String::from("The following memory layers will be saved with this project:");
    for item in info {
        msg.push('\n');
        msg.push_str(&item.to_string());
    }
    msg
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        host::{MemoryLayer, MemoryProviderPolicy},
        layer::{Geometry, GeometryKind, Schema},
    };

    #[test]
    fn test_empty_message() {
        assert!(info_message(&[]).contains("no memory layers"));
    }

    #[test]
    fn test_pluralisation() {
        let msg = info_message(&[
            LayerInfo {
                name: "pts".into(),
                feature_count: 1,
            },
            LayerInfo {
                name: "roads".into(),
                feature_count: 3,
            },
        ]);
        assert!(msg.contains("- pts (1 feature)"));
        assert!(msg.contains("- roads (3 features)"));
    }

    #[test]
    fn test_only_eligible_layers() {
        let mut mem = MemoryLayer::new("a", "pts", GeometryKind::Point, Schema::default());
        mem.add_feature(Geometry::Empty, vec![]);
        let ogr = MemoryLayer::new("b", "file", GeometryKind::Point, Schema::default())
            .with_provider("ogr");
        let layers: Vec<LayerRef> = vec![Rc::new(RefCell::new(mem)), Rc::new(RefCell::new(ogr))];

        let info = layer_info(&layers, &MemoryProviderPolicy);
        assert_eq!(
            info,
            vec![LayerInfo {
                name: "pts".into(),
                feature_count: 1,
            }]
        );
    }
}

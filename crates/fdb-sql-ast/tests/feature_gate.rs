//! Feature Gate Tests
//!
//! Grammar extensions are off by default, toggled by name per session, and
//! checked at construction time.

use fdb_sql_ast::nodes::{
    ColumnList, ConstraintDefinition, ConstraintDrop, ConstraintType, CreateIndex,
    ForeignKeyDefinition, Identifier, IndexColumn, IndexColumnList, IndexDefinition, JoinType,
    StorageFormat, TableName,
};
use fdb_sql_ast::{Error, Feature, FeatureSet, SessionConfig, SessionContext};

mod toggling {
    use super::*;

    #[test]
    fn test_everything_disabled_by_default() {
        let features = FeatureSet::new();
        for feature in Feature::ALL {
            assert!(!features.contains(feature));
            assert_eq!(features.is_enabled(feature.name()), Ok(false));
        }
    }

    #[test]
    fn test_enable_then_disable_by_name() {
        let mut features = FeatureSet::new();
        features.enable("TABLE_GROUPING").unwrap();
        assert_eq!(features.is_enabled("TABLE_GROUPING"), Ok(true));
        assert_eq!(features.is_enabled("STORAGE_FORMAT"), Ok(false));

        features.disable("TABLE_GROUPING").unwrap();
        assert_eq!(features.is_enabled("TABLE_GROUPING"), Ok(false));
    }

    #[test]
    fn test_enable_is_idempotent() {
        let mut features = FeatureSet::new();
        features.enable("INDEX_OPTIONS").unwrap();
        features.enable("INDEX_OPTIONS").unwrap();
        assert_eq!(features.iter().count(), 1);
        features.disable("INDEX_OPTIONS").unwrap();
        features.disable("INDEX_OPTIONS").unwrap();
        assert_eq!(features.iter().count(), 0);
    }

    #[test]
    fn test_unknown_feature_name() {
        let mut features = FeatureSet::new();
        assert_eq!(
            features.enable("TIME_TRAVEL"),
            Err(Error::UnknownFeature("TIME_TRAVEL".to_string()))
        );
        assert!(matches!(features.disable("table_grouping"), Err(Error::UnknownFeature(_))));
        assert!(matches!(features.is_enabled(""), Err(Error::UnknownFeature(_))));
    }

    #[test]
    fn test_sessions_do_not_share_features() {
        let mut first = SessionContext::new();
        let second = SessionContext::new();
        first.features_mut().enable_feature(Feature::TableGrouping);
        assert!(first.is_enabled(Feature::TableGrouping));
        assert!(!second.is_enabled(Feature::TableGrouping));
    }
}

mod overrides {
    use super::*;

    #[test]
    fn test_override_lines_apply_in_order() {
        let mut features = FeatureSet::new();
        features
            .apply_overrides(["+TABLE_GROUPING", "", "+STORAGE_FORMAT", "-TABLE_GROUPING"])
            .unwrap();
        assert!(!features.contains(Feature::TableGrouping));
        assert!(features.contains(Feature::StorageFormat));
    }

    #[test]
    fn test_bad_override_leaves_set_unchanged() {
        let mut features = FeatureSet::new();
        let err = features
            .apply_overrides(["+TABLE_GROUPING", "TABLE_GROUPING"])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFeatureOverride(_)));
        assert_eq!(features.iter().count(), 0);

        let err = features.apply_overrides(["+STORAGE_FORMAT", "+NOPE"]).unwrap_err();
        assert!(matches!(err, Error::UnknownFeature(_)));
        assert!(!features.contains(Feature::StorageFormat));
    }

    #[test]
    fn test_session_config_from_json() {
        let config = SessionConfig::from_json(
            r#"{"features": ["TABLE_GROUPING", "INDEX_OPTIONS"], "max_copy_depth": 64}"#,
        )
        .unwrap();
        let ctx = SessionContext::from_config(config);
        assert!(ctx.is_enabled(Feature::TableGrouping));
        assert!(ctx.is_enabled(Feature::IndexOptions));
        assert!(!ctx.is_enabled(Feature::StorageFormat));
        assert_eq!(ctx.max_copy_depth(), Some(64));
    }

    #[test]
    fn test_session_config_rejects_unknown_feature() {
        assert!(SessionConfig::from_json(r#"{"features": ["TIME_TRAVEL"]}"#).is_err());
    }
}

mod construction {
    use super::*;

    fn group_columns() -> IndexColumnList {
        IndexColumnList::new(vec![
            IndexColumn::new(
                Some(TableName::parse("customers").unwrap()),
                Identifier::new("name"),
                true,
            )
            .unwrap(),
            IndexColumn::new(
                Some(TableName::parse("orders").unwrap()),
                Identifier::new("odate"),
                true,
            )
            .unwrap(),
        ])
        .unwrap()
    }

    fn group_index(ctx: &SessionContext) -> fdb_sql_ast::Result<CreateIndex> {
        CreateIndex::builder(
            TableName::parse("gi").unwrap(),
            TableName::parse("customers").unwrap(),
            group_columns(),
        )
        .join_type(Some(JoinType::LeftOuter))
        .build(ctx)
    }

    #[test]
    fn test_group_index_needs_table_grouping() {
        assert_eq!(
            group_index(&SessionContext::new()).unwrap_err(),
            Error::FeatureDisabled(Feature::TableGrouping)
        );
        assert!(group_index(&SessionContext::with_features([Feature::TableGrouping])).is_ok());
    }

    #[test]
    fn test_storage_format_needs_feature() {
        let make = |ctx: &SessionContext| {
            StorageFormat::new(ctx, Identifier::new("protobuf"), Default::default())
        };
        assert_eq!(
            make(&SessionContext::new()).unwrap_err(),
            Error::FeatureDisabled(Feature::StorageFormat)
        );
        assert!(make(&SessionContext::with_features([Feature::StorageFormat])).is_ok());
    }

    #[test]
    fn test_deferrable_needs_feature() {
        let make = |ctx: &SessionContext| {
            let mut fk = ForeignKeyDefinition::new(
                ColumnList::from_names(["cid"]).unwrap(),
                TableName::parse("customers").unwrap(),
                None,
            );
            fk.deferrable = true;
            ConstraintDefinition::foreign_key(ctx, None, fk)
        };
        assert_eq!(
            make(&SessionContext::new()).unwrap_err(),
            Error::FeatureDisabled(Feature::DeferrableConstraints)
        );
        assert!(make(&SessionContext::with_features([Feature::DeferrableConstraints])).is_ok());
    }

    #[test]
    fn test_grouping_drop_needs_feature() {
        let make = |ctx: &SessionContext| {
            let mut drop = ConstraintDrop::new(ConstraintType::ForeignKey);
            drop.grouping = true;
            ConstraintDefinition::drop_constraint(ctx, Some(TableName::parse("fk1").unwrap()), drop)
        };
        assert_eq!(
            make(&SessionContext::new()).unwrap_err(),
            Error::FeatureDisabled(Feature::TableGrouping)
        );
        assert!(make(&SessionContext::with_features([Feature::TableGrouping])).is_ok());
    }

    #[test]
    fn test_disabling_after_construction_keeps_node() {
        let mut ctx = SessionContext::with_features([Feature::TableGrouping]);
        let index = group_index(&ctx).unwrap();
        ctx.features_mut().disable_feature(Feature::TableGrouping);
        assert_eq!(index.join_type(), Some(JoinType::LeftOuter));
        assert!(group_index(&ctx).is_err());
    }
}

//! Per-method signature extraction.

use super::resolver::{resolve, ResolvedType};
use crate::ast::{Cursor, Type, TypeKind};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How records that are not array shaped are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordPolicy {
    /// Resolve to an opaque `unresolved` scalar and keep going.
    #[default]
    Opaque,
    /// Propagate `ArrayShapeMismatch` to the caller.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub name: String,
    pub position: usize,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    /// Name with the argument list stripped; shared by overloads.
    pub base_name: String,
    pub display_name: String,
    pub return_type: ResolvedType,
    pub arguments: Vec<Argument>,
}

impl MethodSignature {
    pub fn arity(&self) -> usize {
        self.arguments.len()
    }
}

/// Name part of a `name(args...)` display name.
pub fn base_name(display_name: &str) -> Result<&str> {
    display_name
        .find('(')
        .map(|index| &display_name[..index])
        .ok_or_else(|| Error::MalformedDisplayName {
            display_name: display_name.to_string(),
        })
}

#[derive(Debug, Clone, Default)]
pub struct MethodExtractor {
    record_policy: RecordPolicy,
}

impl MethodExtractor {
    pub fn new(record_policy: RecordPolicy) -> Self {
        Self { record_policy }
    }

    /// Extract the signature of a method cursor, keyed by its display name.
    ///
    /// Argument and return information comes from the definition when the
    /// tree has one and from the declaration otherwise (pure virtual or
    /// declared-only methods).
    pub fn extract(&self, method: Cursor<'_>) -> Result<(String, MethodSignature)> {
        let display_name = method.display_name();
        let base_name = base_name(display_name)?.to_string();
        let source = method.definition().unwrap_or(method);

        let result_type = source
            .result_type()
            .ok_or_else(|| Error::UnresolvedType {
                kind: TypeKind::Invalid,
                spelling: format!("<missing return type of {display_name}>"),
            })?;
        let return_type = self.resolve_with_policy(result_type, display_name)?;

        let arguments = source
            .arguments()
            .enumerate()
            .map(|(position, argument)| {
                let ty = argument.cursor_type().ok_or_else(|| Error::UnresolvedType {
                    kind: TypeKind::Invalid,
                    spelling: format!("<missing type of argument {position}>"),
                })?;
                Ok(Argument {
                    name: argument.spelling().to_string(),
                    position,
                    ty: self.resolve_with_policy(ty, display_name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((
            display_name.to_string(),
            MethodSignature {
                base_name,
                display_name: display_name.to_string(),
                return_type,
                arguments,
            },
        ))
    }

    fn resolve_with_policy(&self, ty: Type<'_>, method: &str) -> Result<ResolvedType> {
        match resolve(ty) {
            Err(Error::ArrayShapeMismatch { record, reason })
                if self.record_policy == RecordPolicy::Opaque =>
            {
                warn!(method, record = %record, reason = %reason, "treating record as opaque");
                Ok(ResolvedType::opaque())
            }
            other => other,
        }
    }
}

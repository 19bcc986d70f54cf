//! Walkers over every pointer in a document: `$ref` strings of any kind
//! and discriminator mapping values.
//!
//! `shared` reads pointers, `exclusive` can rewrite them in place. Both are
//! generated from one body.

use super::components::Components;
use super::operation::{MediaType, Operation, PathItem, RequestBodyOrRef, ResponseOrRef};
use super::parameter::ParameterOrRef;
use super::schema::{AdditionalProperties, Schema, SchemaOrRef};
use super::spec::OpenApiSpec;
use indexmap::IndexMap;

/// Which syntactic position a pointer was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// A `$ref` value.
    Ref,
    /// A discriminator mapping value: a `$ref`-style pointer or a bare schema name.
    Mapping,
}

macro_rules! pointer_walker {
    ($module:ident $(, $m:tt)?) => {
        pub mod $module {
            use super::*;

            pub fn document(
                doc: &$($m)? OpenApiSpec,
                f: &mut impl FnMut(PointerKind, &$($m)? String),
            ) {
                for (_, item) in &$($m)? doc.paths {
                    path_item(item, f);
                }
                if let Some(components) = &$($m)? doc.components {
                    self::components(components, f);
                }
            }

            pub fn components(
                components: &$($m)? Components,
                f: &mut impl FnMut(PointerKind, &$($m)? String),
            ) {
                for (_, s) in &$($m)? components.schemas {
                    schema_or_ref(s, f);
                }
                for (_, p) in &$($m)? components.parameters {
                    parameter(p, f);
                }
                for (_, b) in &$($m)? components.request_bodies {
                    request_body(b, f);
                }
                for (_, r) in &$($m)? components.responses {
                    response(r, f);
                }
            }

            fn path_item(item: &$($m)? PathItem, f: &mut impl FnMut(PointerKind, &$($m)? String)) {
                for p in &$($m)? item.parameters {
                    parameter(p, f);
                }
                let ops = [
                    &$($m)? item.get,
                    &$($m)? item.put,
                    &$($m)? item.post,
                    &$($m)? item.delete,
                    &$($m)? item.options,
                    &$($m)? item.head,
                    &$($m)? item.patch,
                    &$($m)? item.trace,
                ];
                for op in ops {
                    if let Some(op) = op {
                        operation(op, f);
                    }
                }
            }

            fn operation(op: &$($m)? Operation, f: &mut impl FnMut(PointerKind, &$($m)? String)) {
                for p in &$($m)? op.parameters {
                    parameter(p, f);
                }
                if let Some(body) = &$($m)? op.request_body {
                    request_body(body, f);
                }
                for (_, r) in &$($m)? op.responses {
                    response(r, f);
                }
            }

            fn parameter(p: &$($m)? ParameterOrRef, f: &mut impl FnMut(PointerKind, &$($m)? String)) {
                match p {
                    ParameterOrRef::Ref { ref_path } => f(PointerKind::Ref, ref_path),
                    ParameterOrRef::Parameter(param) => {
                        if let Some(s) = &$($m)? param.schema {
                            schema_or_ref(s, f);
                        }
                    }
                }
            }

            fn request_body(
                body: &$($m)? RequestBodyOrRef,
                f: &mut impl FnMut(PointerKind, &$($m)? String),
            ) {
                match body {
                    RequestBodyOrRef::Ref { ref_path } => f(PointerKind::Ref, ref_path),
                    RequestBodyOrRef::RequestBody(rb) => content(&$($m)? rb.content, f),
                }
            }

            fn response(r: &$($m)? ResponseOrRef, f: &mut impl FnMut(PointerKind, &$($m)? String)) {
                match r {
                    ResponseOrRef::Ref { ref_path } => f(PointerKind::Ref, ref_path),
                    ResponseOrRef::Response(resp) => content(&$($m)? resp.content, f),
                }
            }

            fn content(
                content: &$($m)? IndexMap<String, MediaType>,
                f: &mut impl FnMut(PointerKind, &$($m)? String),
            ) {
                for (_, mt) in content {
                    if let Some(s) = &$($m)? mt.schema {
                        schema_or_ref(s, f);
                    }
                }
            }

            pub fn schema_or_ref(
                s: &$($m)? SchemaOrRef,
                f: &mut impl FnMut(PointerKind, &$($m)? String),
            ) {
                match s {
                    SchemaOrRef::Ref { ref_path } => f(PointerKind::Ref, ref_path),
                    SchemaOrRef::Schema(schema) => self::schema(schema, f),
                }
            }

            pub fn schema(s: &$($m)? Schema, f: &mut impl FnMut(PointerKind, &$($m)? String)) {
                for (_, p) in &$($m)? s.properties {
                    schema_or_ref(p, f);
                }
                if let Some(items) = &$($m)? s.items {
                    schema_or_ref(items, f);
                }
                for branch in &$($m)? s.all_of {
                    schema_or_ref(branch, f);
                }
                for branch in &$($m)? s.one_of {
                    schema_or_ref(branch, f);
                }
                for branch in &$($m)? s.any_of {
                    schema_or_ref(branch, f);
                }
                if let Some(AdditionalProperties::Schema(extra)) = &$($m)? s.additional_properties {
                    schema_or_ref(extra, f);
                }
                if let Some(d) = &$($m)? s.discriminator {
                    for (_, target) in &$($m)? d.mapping {
                        f(PointerKind::Mapping, target);
                    }
                }
            }
        }
    };
}

pointer_walker!(shared);
pointer_walker!(exclusive, mut);

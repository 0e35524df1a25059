//! Runtime OpenAPI document: one path group and three component schemas per mounted entity.
//!
//! Entities are declared at runtime, so the document is assembled with the utoipa builders
//! rather than derived.

use crate::config::{ColumnInfo, ColumnType, ResolvedEntity, ResolvedModel, CREATED_AT, UPDATED_AT};
use utoipa::openapi::{
    path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder},
    request_body::RequestBodyBuilder,
    schema::{Array, KnownFormat, ObjectBuilder, SchemaFormat, SchemaType, Type},
    ComponentsBuilder, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder, Ref, RefOr,
    Required, Response, ResponseBuilder, Schema,
};

const JSON: &str = "application/json";

/// Build the document for every entity, with paths under `api_prefix`.
pub fn build(model: &ResolvedModel, api_prefix: &str) -> OpenApi {
    let mut paths = PathsBuilder::new();
    let mut components = ComponentsBuilder::new().schema("Error", error_schema());
    for entity in &model.entities {
        let base = format!("{}/{}", api_prefix, entity.path_segment);
        paths = paths
            .path(base.clone(), collection_item(entity))
            .path(format!("{}/paginated", base), paginated_item(entity))
            .path(format!("{}/{{id}}", base), member_item(entity));
        components = components
            .schema(entity.name.clone(), row_schema(entity))
            .schema(format!("{}Create", entity.name), input_schema(entity, true))
            .schema(format!("{}Update", entity.name), input_schema(entity, false));
    }
    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(env!("CARGO_PKG_NAME"))
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths.build())
        .components(Some(components.build()))
        .build()
}

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn object(ty: Type, format: Option<KnownFormat>, nullable: bool) -> ObjectBuilder {
    let schema_type = if nullable {
        SchemaType::Array(vec![ty, Type::Null])
    } else {
        SchemaType::Type(ty)
    };
    let b = ObjectBuilder::new().schema_type(schema_type);
    match format {
        Some(f) => b.format(Some(SchemaFormat::KnownFormat(f))),
        None => b,
    }
}

fn typed(ty: Type, format: Option<KnownFormat>, nullable: bool) -> RefOr<Schema> {
    RefOr::T(Schema::Object(object(ty, format, nullable).build()))
}

fn column_object(ty: ColumnType, nullable: bool) -> ObjectBuilder {
    match ty {
        ColumnType::Text => object(Type::String, None, nullable),
        ColumnType::Int => object(Type::Integer, Some(KnownFormat::Int32), nullable),
        ColumnType::BigInt => object(Type::Integer, Some(KnownFormat::Int64), nullable),
        ColumnType::Float => object(Type::Number, Some(KnownFormat::Double), nullable),
        ColumnType::Bool => object(Type::Boolean, None, nullable),
        ColumnType::Timestamp => object(Type::String, Some(KnownFormat::DateTime), nullable),
        ColumnType::Uuid => object(Type::String, Some(KnownFormat::Uuid), nullable),
        ColumnType::Json => ObjectBuilder::new().schema_type(SchemaType::AnyValue),
    }
}

fn column_schema(ty: ColumnType, nullable: bool) -> RefOr<Schema> {
    RefOr::T(Schema::Object(column_object(ty, nullable).build()))
}

/// Column schema carrying its validation rule as JSON Schema keywords.
fn with_rule(col: &ColumnInfo) -> RefOr<Schema> {
    let mut b = column_object(col.column_type, col.nullable);
    if let Some(rule) = &col.validation {
        b = b
            .min_length(rule.min_length.map(|n| n as usize))
            .max_length(rule.max_length.map(|n| n as usize))
            .pattern(rule.pattern.clone())
            .minimum(rule.minimum)
            .maximum(rule.maximum);
        if let Some(allowed) = &rule.allowed {
            b = b.enum_values(Some(allowed.clone()));
        }
    }
    RefOr::T(Schema::Object(b.build()))
}

/// A stored row as returned in `data`: key, visible columns, timestamps.
fn row_schema(entity: &ResolvedEntity) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new()
        .schema_type(Type::Object)
        .property(entity.pk.name.clone(), column_schema(entity.pk.pk_type.column_type(), false))
        .required(entity.pk.name.clone());
    for c in entity.visible_columns() {
        b = b.property(c.name.clone(), column_schema(c.column_type, c.nullable)).required(c.name.clone());
    }
    for ts in [CREATED_AT, UPDATED_AT] {
        b = b.property(ts, column_schema(ColumnType::Timestamp, false)).required(ts);
    }
    RefOr::T(Schema::Object(b.build()))
}

/// Writable columns. Only create marks required ones.
fn input_schema(entity: &ResolvedEntity, create: bool) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new().schema_type(Type::Object);
    for c in &entity.columns {
        b = b.property(c.name.clone(), with_rule(c));
        if create && c.is_required() {
            b = b.required(c.name.clone());
        }
    }
    RefOr::T(Schema::Object(b.build()))
}

fn error_schema() -> RefOr<Schema> {
    let detail = ObjectBuilder::new()
        .schema_type(Type::Object)
        .property("code", typed(Type::String, None, false))
        .property("message", typed(Type::String, None, false))
        .property("details", column_schema(ColumnType::Json, true))
        .required("code")
        .required("message");
    RefOr::T(Schema::Object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("status", typed(Type::String, None, false))
            .property("error", RefOr::T(Schema::Object(detail.build())))
            .required("status")
            .required("error")
            .build(),
    ))
}

fn envelope(data: Option<RefOr<Schema>>, extra: &[(&str, Type)]) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new()
        .schema_type(Type::Object)
        .property("status", typed(Type::String, None, false))
        .property("message", typed(Type::String, None, false))
        .required("status")
        .required("message");
    if let Some(d) = data {
        b = b.property("data", d).required("data");
    }
    for (name, ty) in extra {
        b = b.property(*name, typed(ty.clone(), None, false)).required(*name);
    }
    RefOr::T(Schema::Object(b.build()))
}

fn json_response(description: &str, schema: RefOr<Schema>) -> Response {
    ResponseBuilder::new()
        .description(description)
        .content(JSON, ContentBuilder::new().schema(Some(schema)).build())
        .build()
}

fn error_response(description: &str) -> Response {
    json_response(description, schema_ref("Error"))
}

fn single(entity: &ResolvedEntity) -> RefOr<Schema> {
    envelope(Some(schema_ref(&entity.name)), &[])
}

fn many(entity: &ResolvedEntity) -> RefOr<Schema> {
    envelope(Some(RefOr::T(Schema::Array(Array::new(schema_ref(&entity.name))))), &[])
}

fn operation(entity: &ResolvedEntity, id: &str, summary: String) -> OperationBuilder {
    OperationBuilder::new()
        .operation_id(Some(format!("{}_{}", id, entity.path_segment)))
        .summary(Some(summary))
        .tags(Some(vec![entity.name.clone()]))
        .response("403", error_response("Permission denied"))
}

fn query_param(name: &str, ty: Type) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .schema(Some(typed(ty, None, false)))
        .build()
}

fn id_param(entity: &ResolvedEntity) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name("id")
        .parameter_in(ParameterIn::Path)
        .required(Required::True)
        .schema(Some(column_schema(entity.pk.pk_type.column_type(), false)))
        .build()
}

fn body(entity: &ResolvedEntity, suffix: &str) -> utoipa::openapi::request_body::RequestBody {
    RequestBodyBuilder::new()
        .content(
            JSON,
            ContentBuilder::new()
                .schema(Some(schema_ref(&format!("{}{}", entity.name, suffix))))
                .build(),
        )
        .required(Some(Required::True))
        .build()
}

fn collection_item(entity: &ResolvedEntity) -> utoipa::openapi::PathItem {
    let list = operation(entity, "list", format!("List all {} records", entity.name))
        .parameter(query_param("sort_by", Type::String))
        .parameter(query_param("order", Type::String))
        .response("200", json_response("All records", many(entity)))
        .response("422", error_response("Invalid ordering parameters"))
        .build();
    let create = operation(entity, "create", format!("Create a {}", entity.name))
        .request_body(Some(body(entity, "Create")))
        .response("201", json_response("Created record", single(entity)))
        .response("422", error_response("Invalid input"))
        .build();
    PathItemBuilder::new()
        .operation(HttpMethod::Get, list)
        .operation(HttpMethod::Post, create)
        .build()
}

fn paginated_item(entity: &ResolvedEntity) -> utoipa::openapi::PathItem {
    let page = envelope(
        Some(RefOr::T(Schema::Array(Array::new(schema_ref(&entity.name))))),
        &[
            ("page", Type::Integer),
            ("page_size", Type::Integer),
            ("total_count", Type::Integer),
            ("total_pages", Type::Integer),
        ],
    );
    let op = operation(entity, "list_paginated", format!("List {} records page by page", entity.name))
        .parameter(query_param("page", Type::Integer))
        .parameter(query_param("size", Type::Integer))
        .parameter(query_param("sort_by", Type::String))
        .parameter(query_param("order", Type::String))
        .response("200", json_response("One page of records", page))
        .response("422", error_response("Invalid page or size"))
        .build();
    PathItemBuilder::new().operation(HttpMethod::Get, op).build()
}

fn member_item(entity: &ResolvedEntity) -> utoipa::openapi::PathItem {
    let read = operation(entity, "get", format!("Get a {} by id", entity.name))
        .parameter(id_param(entity))
        .response("200", json_response("Record found", single(entity)))
        .response("404", error_response("No record with this id"))
        .build();
    let update = |method: &str| {
        operation(entity, method, format!("Update a {}; absent fields are kept", entity.name))
            .parameter(id_param(entity))
            .request_body(Some(body(entity, "Update")))
            .response("200", json_response("Updated record", single(entity)))
            .response("404", error_response("No record with this id"))
            .response("422", error_response("Invalid input"))
            .build()
    };
    let delete = operation(entity, "delete", format!("Delete a {}", entity.name))
        .parameter(id_param(entity))
        .response("200", json_response("Record deleted", envelope(None, &[])))
        .response("404", error_response("No record with this id"))
        .build();
    PathItemBuilder::new()
        .operation(HttpMethod::Get, read)
        .operation(HttpMethod::Put, update("replace"))
        .operation(HttpMethod::Patch, update("update"))
        .operation(HttpMethod::Delete, delete)
        .build()
}

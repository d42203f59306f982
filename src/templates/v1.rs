use serde_json::json;

use super::{expires_at_index, plain_index, Template};
use crate::schema::SCHEMAS_COLLECTION;

/// Every v1 template, in seeding order
pub fn templates() -> Vec<Template> {
    vec![
        // schemas
        Template::new("schemaTypes", "SchemaType", json!({
            "name": { "type": "String", "required": true },
            "type": "Number"
        }))
        .data(json!([
            { "name": "Normal", "type": 0 },
            { "name": "System", "type": 1 }
        ])),
        Template::new(SCHEMAS_COLLECTION, "Schema", json!({
            "name": { "type": "String", "required": true },
            "definition": { "type": "String" },
            "indices": { "type": "String" },
            "SchemaType": { "type": "ObjectId", "ref": "SchemaType" }
        })),
        // auth
        Template::new("persons", "Person", json!({
            "firstName": { "type": "String", "required": true },
            "middleName": "String",
            "lastName": { "type": "String", "required": true },
            "birthdate": "Date",
            "address": "String",
            "contactNumber1": "String",
            "contactNumber2": "String"
        })),
        Template::new("userTypes", "UserType", json!({
            "name": { "type": "String", "required": true },
            "type": "Number"
        }))
        .data(json!([
            { "name": "Normal", "type": 0 },
            { "name": "Administrator", "type": 1 },
            { "name": "Technical Administrator", "type": 2 }
        ])),
        Template::new("users", "User", json!({
            "Person": { "type": "ObjectId", "ref": "Person" },
            "UserType": { "type": "Array", "items": { "type": "ObjectId", "ref": "UserType" } },
            "email": { "type": "String", "required": true, "unique": true },
            "password": { "type": "String", "required": true },
            "emailConfirmed": { "type": "Boolean", "default": false },
            "contactNumber1": "Number",
            "contactNumber2": "Number",
            "GoogleProviderId": "String",
            "FacebookProviderId": "String",
            "GitHubProviderId": "String"
        })),
        Template::new("sessions", "Session", json!({
            "User": { "type": "ObjectId", "ref": "User", "required": true },
            "token": { "type": "String", "required": true, "unique": true },
            "oldToken": { "type": "String", "default": null },
            "accessJti": { "type": "String" },
            "ip": "String",
            "userAgent": "String",
            "expiresAt": { "type": "Date", "required": true }
        }))
        .indices(vec![expires_at_index()]),
        // app
        Template::new("apps", "Apps", json!({
            "name": { "type": "String", "required": true, "unique": true },
            "slug": "String",
            "AppStatus": { "type": "ObjectId", "ref": "AppStatus" },
            "AppOwner": { "type": "ObjectId", "ref": "AppOwner" },
            "description": "String",
            "logo": "String",
            "images": "String",
            "domains": "String",
            "apiUrl": "String",
            "frontendUrl": "String",
            "dbName": "String",
            "collections": "String",
            "techTags": "String",
            "envs": "String",
            "versions": "String",
            "features": "String",
            "public": "Boolean",
            "publishedAt": "Date"
        }))
        .admin_only()
        .indices(vec![expires_at_index()])
        .data(json!([
            { "name": "AppCreator", "domains": "[\"http://localhost:3000\"]" },
            { "name": "EntityCreator", "domains": "[\"http://localhost:3001\"]" },
            { "name": "EntityDashboard", "domains": "[\"http://localhost:3002\"]" }
        ])),
        Template::new("appStatus", "AppStatus", json!({
            "name": "String",
            "description": "String"
        }))
        .admin_only()
        .data(json!([
            { "name": "active" },
            { "name": "inactive" },
            { "name": "archived" },
            { "name": "maintenance" }
        ])),
        Template::new("appOwners", "AppOwner", json!({
            "name": "String",
            "description": "String"
        }))
        .admin_only(),
        // tokens
        Template::new("emailVerificationTokens", "EmailVerificationToken", json!({
            "User": { "type": "ObjectId", "ref": "User", "required": true },
            "email": { "type": "String", "required": true, "unique": true },
            "token": { "type": "String", "required": true },
            "hashed": "String",
            "used": { "type": "Boolean", "default": false },
            "expiresAt": "Date"
        }))
        .indices(vec![expires_at_index()]),
        Template::new("otpTokens", "OtpToken", json!({
            "User": { "type": "ObjectId", "ref": "User", "required": true },
            "token": { "type": "String", "required": true },
            "hashed": "String",
            "used": { "type": "Boolean", "default": false },
            "expiresAt": "Date"
        }))
        .indices(vec![expires_at_index()]),
        // permissions
        Template::new("roles", "Role", json!({
            "name": { "type": "String", "required": true },
            "type": "Number"
        }))
        .data(json!([
            { "name": "Normal", "type": 0 },
            { "name": "Administrator", "type": 1 },
            { "name": "Technical Administrator", "type": 2 }
        ])),
        Template::new("permissionSubjects", "PermissionSubject", json!({
            "name": { "type": "String", "required": true }
        }))
        .data(json!([
            { "name": "User" },
            { "name": "Role" },
            { "name": "Environment" },
            { "name": "Organization" },
            { "name": "Workspace" }
        ])),
        Template::new("permissionActions", "PermissionAction", json!({
            "name": { "type": "String", "required": true }
        }))
        .data(json!([
            { "name": "read" },
            { "name": "create" },
            { "name": "update" },
            { "name": "delete" },
            { "name": "bulkCreate" },
            { "name": "bulkUpdate" },
            { "name": "bulkDelete" }
        ])),
        Template::new("permissionResources", "PermissionResource", json!({
            "name": { "type": "String", "required": true }
        }))
        .data(json!([
            { "name": "Role" },
            { "name": "Environment" },
            { "name": "Organization" },
            { "name": "Workspace" },
            { "name": "Post" },
            { "name": "Comment" },
            { "name": "Blog" }
        ])),
        Template::new("permissionScopes", "PermissionScope", json!({
            "name": { "type": "String", "required": true },
            "value": { "type": "Mixed" }
        }))
        .data(json!([
            { "name": "Role" },
            { "name": "Environment" },
            { "name": "Organization" },
            { "name": "Workspace" },
            { "name": "Post" },
            { "name": "Comment" },
            { "name": "Blog" }
        ])),
        Template::new("permissions", "Permission", json!({
            "subject": { "type": "ObjectId", "ref": "PermissionSubject", "required": true },
            "subjectRefId": { "type": "ObjectId", "required": true },
            "action": { "type": "ObjectId", "ref": "PermissionAction", "required": true },
            "resource": { "type": "ObjectId", "ref": "PermissionResource", "required": true },
            "resourceRefId": { "type": "ObjectId" },
            "scope": { "type": "Array", "items": { "type": "ObjectId", "ref": "PermissionScope" } }
        }))
        .indices(vec![plain_index("subjectRefId"), plain_index("action"), plain_index("resourceRefId")]),
        // tests
        Template::new("tests", "Tests", json!({
            "name": "String",
            "expiresAt": "Date"
        }))
        .indices(vec![expires_at_index()]),
    ]
}

//! Bundled sample declaration.
//!
//! Used by `strata sample` and as the fixture for end-to-end tests. It has
//! every relation kind the generator treats differently: a dependency chain
//! under an activable root, an optional reference, a many-to-many link with
//! relation sub-actions, and a custom use case.

use strata_core::domain::DomainDeclaration;

pub const SHOP_DOMAIN: &str = r#"# Strata sample: a small invoicing shop.

[project]
module = "github.com/acme/shop"

[[entities]]
name = "customer"
doc = "Customer is someone invoices are issued to."
activable = true
fields = [
    { name = "name", type = "string", rules = ["required"] },
    { name = "email", type = "string", rules = ["required", "email", "unique"] },
]

[[entities]]
name = "category"
fields = [
    { name = "name", type = "string", rules = ["required", "unique"] },
]

[[entities]]
name = "tag"
fields = [
    { name = "label", type = "string", rules = ["required", "unique"] },
    { name = "color", type = "string", rules = ["hexcolor"] },
]

[[entities]]
name = "invoice"
archivable = true
fields = [
    { name = "number", type = "string", rules = ["required", { rule = "uniqueIn", value = "customer" }] },
    { name = "issuedAt", type = "time", rules = ["required"] },
    { name = "note", type = "string" },
]

[[entities]]
name = "invoiceLine"
fields = [
    { name = "description", type = "string", rules = ["required"] },
    { name = "quantity", type = "int", rules = [{ rule = "gt", value = "0" }] },
    { name = "unitPrice", type = "float", rules = [{ rule = "gte", value = "0" }] },
]

[[relations]]
source = "invoice"
kind = "belongsTo"
target = "customer"

[[relations]]
source = "invoiceLine"
kind = "subresourcesOf"
target = "invoice"

[[relations]]
source = "invoiceLine"
kind = "manyToOne"
target = "category"
ignoreReverse = true

[[relations]]
source = "invoice"
kind = "manyToMany"
target = "tag"

[[repositories]]
entity = "customer"

[[repositories]]
entity = "category"

[[repositories]]
entity = "tag"

[[repositories]]
entity = "invoice"

[[repositories]]
entity = "invoiceLine"

[[cruds]]
entity = "customer"
get = true
getActive = true
list = true
listActive = true
create = true
update = true
delete = true

[[cruds]]
entity = "category"
get = true
list = true
create = true

[[cruds]]
entity = "tag"
get = true
list = true
create = true
update = true
delete = true

[[cruds]]
entity = "invoice"
get = true
list = true
create = true
update = true
delete = true
relations = [{ target = "tag", add = true, remove = true, list = true }]

[[cruds]]
entity = "invoiceLine"
get = true
list = true
create = true
update = true
delete = true

[[usecases]]
name = "closeMonth"
doc = "CloseMonth locks every invoice issued in a month."
request = [
    { name = "month", type = "string", rules = ["required"] },
]
response = [
    { name = "closed", type = "int" },
]
"#;

/// The sample, parsed.
pub fn shop_domain() -> Result<DomainDeclaration, toml::de::Error> {
    toml::from_str(SHOP_DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::builder::{BuildConfig, DomainBuilder};

    #[test]
    fn sample_parses() {
        let decl = shop_domain().unwrap();
        assert_eq!(decl.entities.len(), 5);
        assert_eq!(decl.project.module.as_deref(), Some("github.com/acme/shop"));
        assert!(decl.relations[2].ignore_reverse);
    }

    #[test]
    fn sample_builds_and_renders() {
        let built = DomainBuilder::build(BuildConfig::default(), shop_domain().unwrap()).unwrap();
        let files = built.render().unwrap();
        assert!(files.iter().any(|f| f.path == "internal/usecase/invoice_line.go"));
        assert!(files.iter().any(|f| f.path == "sdk/invoice-line.ts"));
    }
}

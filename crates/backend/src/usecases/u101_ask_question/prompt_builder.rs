use super::context_cache::DatabaseContext;

/// Customers listed in the prompt before the ellipsis
const PROMPT_CUSTOMERS: usize = 20;
/// Products listed in the prompt before the ellipsis
const PROMPT_PRODUCTS: usize = 15;

/// System prompt for text-to-SQL: static schema, live values, matching rules, reply format.
pub fn build_prompt(context: &DatabaseContext, schema: &str) -> String {
    let mut prompt = String::with_capacity(6 * 1024);

    prompt.push_str(
        "You are a SQL expert for a sales analytics database. \
         Generate PostgreSQL queries based on user questions.\n\n",
    );

    // ─── Schema ───
    prompt.push_str(&format!("## Database Schema: {}\n\n### Tables:\n\n", schema));
    prompt.push_str(&format!(
        r#"**sales_orders** - Confirmed purchases
- order_id: TEXT PRIMARY KEY
- order_date: DATE (data available from {min} to {max})
- customer_id: TEXT (FK -> customers)
- product_category: TEXT
- product_name: TEXT
- quantity: INTEGER
- revenue_amount: NUMERIC(12,2) (currency: MYR)
- delivery_status: delivery_status_enum ('Pending', 'Shipped', 'Delivered', 'Cancelled')
- salesperson_id: TEXT (FK -> salespeople)
- unit_price: NUMERIC(12,2)
- unit_cost: NUMERIC(12,2)
- gross_profit: NUMERIC(12,2)
- discount_rate: NUMERIC(5,2)
- sales_channel: TEXT ('Direct', 'Distributor', 'Online', 'Key Account')

**sales_quotations** - Proposals
- quotation_id: TEXT PRIMARY KEY
- quotation_date: DATE
- customer_id: TEXT
- product_category: TEXT
- quoted_amount: NUMERIC(12,2)
- status: quotation_status_enum ('Draft', 'Active', 'Completed', 'Lost')
- salesperson_id: TEXT
- expected_close_date: DATE
- estimated_margin: NUMERIC(12,2)
- probability: NUMERIC(5,2)

**customers**
- customer_id: TEXT PRIMARY KEY
- customer_name: TEXT
- customer_segment: TEXT ('Retail', 'Commercial', 'Industrial', 'Distributor', 'Hospitality')
- region: TEXT ('Kuala Lumpur', 'Penang', 'Johor Bahru', 'Kuching', 'Melaka', 'Ipoh', 'Sabah')
- industry: TEXT
- credit_limit, credit_utilized: NUMERIC(12,2)

**salespeople**
- salesperson_id: TEXT PRIMARY KEY
- salesperson_name: TEXT
- department: TEXT
- territory: TEXT ('Central', 'North', 'South', 'East', 'Key Accounts', 'Export')

**product_catalog**
- product_id: TEXT PRIMARY KEY
- product_name, product_category, product_family: TEXT
- unit_cost, unit_price: NUMERIC(12,2)
- lifecycle_stage: TEXT ('Launch', 'Growth', 'Mature')

**sales_targets** - Target amounts by period
- target_date: DATE
- granularity: TEXT ('company', 'category', 'salesperson')
- entity_id: TEXT
- target_amount: NUMERIC(12,2)

"#,
        min = context.date_range.min.format("%Y-%m-%d"),
        max = context.date_range.max.format("%Y-%m-%d"),
    ));

    // ─── Live values ───
    prompt.push_str("## ACTUAL DATA VALUES (use these for matching):\n\n");
    prompt.push_str(&format!(
        "**Salespeople names:** {}\n\n",
        context.salespeople.join(", ")
    ));
    prompt.push_str(&format!(
        "**Sample customers:** {}...\n\n",
        head(&context.customers, PROMPT_CUSTOMERS)
    ));
    prompt.push_str(&format!(
        "**Product categories:** {}\n\n",
        context.categories.join(", ")
    ));
    prompt.push_str(&format!(
        "**Sample products:** {}...\n\n",
        head(&context.products, PROMPT_PRODUCTS)
    ));

    // ─── Rules ───
    prompt.push_str(&format!(
        r#"## IMPORTANT RULES FOR FLEXIBLE MATCHING:

1. **ALWAYS use case-insensitive matching with ILIKE for text columns:**
   - Instead of: WHERE salesperson_name = 'James'
   - Use: WHERE LOWER(salesperson_name) ILIKE LOWER('%james%')

2. **For names, use partial/fuzzy matching:**
   - User says "james" -> match "JAMES CHEYU" using ILIKE '%james%'
   - User says "lim" -> match "LIM WEI HONG" using ILIKE '%lim%'

3. **Match the closest name from the actual data above:**
   - If user says "chong sales", match to the salesperson containing "chong"
   - If user says "aurora customer", match customer containing "aurora"

4. **For joins with salespeople or customers, use flexible matching:**
   ```sql
   JOIN {schema}.salespeople s ON o.salesperson_id = s.salesperson_id
   WHERE LOWER(s.salesperson_name) ILIKE LOWER('%user_input%')
   ```

5. **Always use schema prefix:** {schema}.table_name

6. **Date handling:**
   - Use CURRENT_DATE for "today", "this month", etc.
   - Always filter: AND order_date <= CURRENT_DATE (exclude future data)
   - Use date_trunc() for period grouping

7. **Format results:**
   - Use ROUND(value, 2) for currency
   - Limit to 10-20 rows unless aggregating
   - Use CTEs for complex queries

8. **Only SELECT queries allowed** (no INSERT/UPDATE/DELETE)

9. **Cast enums to text:** status::text, delivery_status::text

"#,
        schema = schema
    ));

    // ─── Reply format ───
    prompt.push_str(
        r#"## Output Format:
Return a JSON object:
{
  "sql": "SELECT ...",
  "explanation": "Brief explanation of what the query does",
  "visualization_type": "scalar|table|bar|line|pie"
}"#,
    );

    prompt
}

fn head(values: &[String], n: usize) -> String {
    values.iter().take(n).map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u101_ask_question::context_cache::DateRange;
    use chrono::NaiveDate;

    fn context() -> DatabaseContext {
        DatabaseContext {
            salespeople: vec!["JAMES CHEYU".into(), "LIM WEI HONG".into()],
            customers: (1..=30).map(|i| format!("Customer {:02}", i)).collect(),
            products: (1..=20).map(|i| format!("Product {:02}", i)).collect(),
            categories: vec!["Cables".into(), "Lighting".into()],
            date_range: DateRange {
                min: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                max: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            },
        }
    }

    #[test]
    fn test_live_values_are_listed() {
        let prompt = build_prompt(&context(), "sales_insights");

        assert!(prompt.contains("**Salespeople names:** JAMES CHEYU, LIM WEI HONG\n"));
        assert!(prompt.contains("**Product categories:** Cables, Lighting\n"));
        assert!(prompt.contains("data available from 2024-01-01 to 2026-10-15"));
    }

    #[test]
    fn test_samples_are_truncated() {
        let prompt = build_prompt(&context(), "sales_insights");

        assert!(prompt.contains("Customer 20..."));
        assert!(!prompt.contains("Customer 21"));
        assert!(prompt.contains("Product 15..."));
        assert!(!prompt.contains("Product 16"));
    }

    #[test]
    fn test_rules_and_reply_format() {
        let prompt = build_prompt(&context(), "sales_insights");

        assert!(prompt.contains("## Database Schema: sales_insights"));
        assert!(prompt.contains("**Always use schema prefix:** sales_insights.table_name"));
        assert!(prompt.contains("ILIKE"));
        assert!(prompt.contains("CURRENT_DATE"));
        assert!(prompt.contains("\"visualization_type\": \"scalar|table|bar|line|pie\""));
        for table in [
            "sales_orders",
            "sales_quotations",
            "customers",
            "salespeople",
            "product_catalog",
            "sales_targets",
        ] {
            assert!(prompt.contains(&format!("**{}**", table)), "missing {}", table);
        }
    }
}

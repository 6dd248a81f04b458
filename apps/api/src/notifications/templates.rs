//! Round-keyed email templates served to the front end.
//!
//! Seeded once at startup and shared read-only through `AppState`.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailTemplate {
    pub id: &'static str,
    pub subject: &'static str,
    pub body: &'static str,
}

const LEVEL1_TASK_BODY: &str = "Dear {name},\n\n\
Congratulations on advancing to the Level 1 interview stage at Hash Agile Technologies! \
We are excited to have you progress further in our selection process.\n\n\
Please find below the instructions for your next task:\n\n\
### **Installation Instructions**\n\n\
1. **Read about Apache Solr:** Familiarize yourself with Solr by visiting the [Solr Tutorial](https://solr.apache.org/guide/).\n\
2. **Install Apache Solr:** Install Apache Solr on your local machine following the official [installation guide](https://solr.apache.org/guide/installing-solr.html).\n\
3. **Configure Solr Port:** Start the Solr service on port **8989** instead of the default port.\n\
4. **Download Employee Dataset:** Obtain the Employee Dataset from [Kaggle](https://www.kaggle.com/datasets/williamlucas0/employee-sample-data).\n\n\
Please complete the task and submit within 12 hours.\n\n\
Best regards,\n\nHash Agile Technologies";

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    rounds: HashMap<&'static str, Vec<EmailTemplate>>,
}

impl TemplateCatalog {
    /// The templates shipped with the service.
    pub fn builtin() -> Self {
        let mut rounds = HashMap::new();
        rounds.insert(
            "level1",
            vec![EmailTemplate {
                id: "level1_template1",
                subject: "Level 1 Interview Task Assignment",
                body: LEVEL1_TASK_BODY,
            }],
        );
        Self { rounds }
    }

    pub fn get(&self, round: &str) -> Option<&[EmailTemplate]> {
        self.rounds.get(round).map(Vec::as_slice)
    }

    pub fn rounds(&self) -> impl Iterator<Item = &str> + '_ {
        self.rounds.keys().copied()
    }
}
